#![deny(missing_docs)]
//! # agentex — umbrella crate
//!
//! Provides a single import surface for the agent execution platform.
//! Re-exports each subsystem crate behind a feature flag, plus a
//! `prelude` for the happy path: declare an [`Agent`](agentex_core::Agent),
//! pick a [`Planner`](agentex_planner::Planner), drive it with an
//! [`Executor`](agentex_executor::Executor) or a
//! [`Host`](agentex_host::Host).

#[cfg(feature = "core")]
pub use agentex_core;
#[cfg(feature = "core")]
pub use agentex_context;
#[cfg(feature = "core")]
pub use agentex_llm;
#[cfg(feature = "core")]
pub use agentex_tool;
#[cfg(feature = "events")]
pub use agentex_events;
#[cfg(feature = "executor")]
pub use agentex_executor;
#[cfg(feature = "host")]
pub use agentex_host;
#[cfg(feature = "planner")]
pub use agentex_planner;
#[cfg(feature = "store")]
pub use agentex_store;
#[cfg(feature = "toolloop")]
pub use agentex_toolloop;

/// Happy-path imports for composing agentex systems.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use agentex_core::{
        Action, Agent, AgentProcess, Awaitable, AwaitableKind, Blackboard, Condition, DurationMs, EarlyTermination,
        Event, EventKind, Goal, Predicate, ProcessStatus, QosConfig, WorldState,
    };

    #[cfg(feature = "core")]
    pub use agentex_tool::{ToolDefinition, ToolDyn, ToolError, ToolGroupRegistry, ToolRegistry};

    #[cfg(feature = "core")]
    pub use agentex_llm::{ContextStrategy, Provider, ProviderError};

    #[cfg(feature = "events")]
    pub use agentex_events::{EventBus, EventListener};

    #[cfg(feature = "planner")]
    pub use agentex_planner::{GoapPlanner, Plan, PlanOutcome, Planner, SupervisorPlanner, UtilityPlanner};

    #[cfg(feature = "toolloop")]
    pub use agentex_toolloop::ToolLoop;

    #[cfg(feature = "executor")]
    pub use agentex_executor::Executor;

    #[cfg(feature = "host")]
    pub use agentex_host::{Host, KillSwitch};

    #[cfg(feature = "store")]
    pub use agentex_store::{FsStore, MemoryStore};
}
