//! # agentex-core — data model and protocol traits for the agent execution platform
//!
//! This crate is the leaf of the workspace: the typed value registry
//! (C1), the blackboard (C2), the world-state projector (C3), the
//! action/goal/condition model (C4), process/status types, the
//! awaitable protocol (C9), the error taxonomy, and the event
//! vocabulary fanned out by `agentex-events`.
//!
//! ## Design Principle
//!
//! Every type here is a pure descriptor or a pure data structure — no
//! crate below this one runs an LLM call, executes a tool, or searches
//! for a plan. `agentex-core` defines *what the platform needs to agree
//! on*; `agentex-planner`, `agentex-executor`, and `agentex-toolloop`
//! define *how it gets done*.
//!
//! ## Dependency Notes
//!
//! Like the layer this crate descends from, it leans on
//! `serde_json::Value` for extension data (tool inputs, opaque agent
//! metadata, blackboard values tagged only by a `DomainType` name). The
//! alternative — generic `T: Serialize` everywhere — would complicate
//! object safety on `ActionBody` without practical benefit.

#![deny(missing_docs)]

pub mod awaitable;
pub mod blackboard;
pub mod duration;
pub mod error;
pub mod event;
pub mod id;
pub mod model;
pub mod process;
pub mod store;
pub mod value;
pub mod world;

pub use awaitable::{Awaitable, AwaitableKind, ResponseOutcome};
pub use blackboard::{Blackboard, ObjectEntry};
pub use duration::DurationMs;
pub use error::{ExecutorError, HostError, PlannerError, StoreError, ToolLoopError, ValueError};
pub use event::{Event, EventKind};
pub use id::{AgentId, AwaitableId, ProcessId, ToolCallId};
pub use model::{
    Action, ActionBody, ActionError, ActionResult, ActionStatus, Agent, Binding,
    BlackboardUpdater, Condition, ConditionKind, ControlSignal, ErrorKind, Goal, PostEffect,
    Predicate, ProcessContext, QosConfig,
};
pub use process::{AgentProcess, EarlyTermination, HistoryEntry, ProcessStatus, Usage};
pub use store::{AwaitableStore, ProcessStore};
pub use value::{DomainType, DomainTypeKind, DomainValue, PropertyDescriptor, TypeRegistry};
pub use world::{CustomPredicate, WorldState, WorldStateProjector};
