//! Error taxonomy (§7), one `thiserror` enum per subsystem.
//!
//! Control-flow signals (`ReplanRequested`, `AwaitableResponse`,
//! `ProcessKilled`) are deliberately **not** members of any enum here —
//! §7 requires they bypass blanket error handling, so they live in
//! [`crate::model::ControlSignal`] and travel through a dedicated `Err`
//! arm ([`crate::model::ActionError::ControlFlow`]) that a generic
//! `?`-propagating handler still sees explicitly instead of silently
//! unifying with business failures.

use thiserror::Error;

/// Errors from running an action inside the executor's QoS envelope.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The action ran and reported `ActionStatus::Failed` (§7 `ActionBusinessFailure`).
    #[error("action business failure: {0}")]
    ActionBusinessFailure(String),

    /// A thrown error classified as retriable by QoS, surfaced after
    /// the retry budget was exhausted.
    #[error("action transient failure (QoS exhausted): {0}")]
    ActionTransientFailure(String),

    /// Input or output validation was rejected by a guard.
    #[error("guard rail violation: {0}")]
    GuardRailViolation(String),

    /// A required collaborator (LLM, tool registry) was absent at
    /// invocation construction time.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from the planner (C5).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PlannerError {
    /// No plan reaches any goal from the current world state.
    #[error("no plan found reaching any goal")]
    NoPlanFound,

    /// GOAP's A* search exhausted its node budget before finding a plan.
    #[error("node budget of {0} expansions exhausted")]
    NodeBudgetExceeded(usize),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from the tool loop (C7).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolLoopError {
    /// A tool call referenced a name not in `available_tools`.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// A tool call exceeded its per-tool deadline in parallel mode.
    #[error("tool timed out: {0}")]
    ToolTimeout(String),

    /// The loop exceeded `max_iterations` without the model stopping
    /// its tool calls.
    #[error("max iterations ({0}) exceeded")]
    MaxIterationsExceeded(usize),

    /// Structured output did not conform to the expected schema after
    /// the configured number of retry attempts.
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from persistence backends (§6 "Persistence").
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from multi-process hosting (§5).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HostError {
    /// `dispatch`/`dispatch_many` named an agent id with no registered
    /// executor.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// The `tokio` task driving a process panicked or was cancelled
    /// before it could finish.
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from the typed value registry (C1).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ValueError {
    /// A domain type was referenced that has not been registered.
    #[error("unknown domain type: {0}")]
    UnknownType(String),

    /// Registering a type would introduce a cycle in its parent chain.
    #[error("cyclic parent chain for type: {0}")]
    CyclicParents(String),

    /// A value failed to serialize/deserialize against its declared type.
    #[error("value error: {0}")]
    Invalid(String),
}
