//! Event vocabulary shared by the executor, tool loop, and planner —
//! the payload types the event bus (`agentex-events`) fans out (§4.5).
//!
//! These types are data only; the fan-out mechanism (listener registry,
//! dispatch ordering) lives in the `agentex-events` crate so that `core`
//! has no knowledge of how events are delivered.

use crate::id::ProcessId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The event kinds enumerated in §4.5. Every kind carries enough context
/// to reconstruct what happened without a second lookup.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A process was created.
    ProcessCreated,
    /// The executor is about to ask the planner for a plan.
    ReadyToPlan {
        /// The projected world state at this moment.
        world_state: std::collections::HashMap<String, bool>,
    },
    /// The planner returned a plan.
    PlanFormulated {
        /// Action names in execution order.
        actions: Vec<String>,
    },
    /// An action is about to run.
    ActionStart {
        /// The action's name.
        action: String,
        /// Which QoS attempt this is.
        attempt: u32,
    },
    /// An action finished (successfully or not).
    ActionResult {
        /// The action's name.
        action: String,
        /// Human-readable outcome summary.
        outcome: String,
    },
    /// A tool call is about to execute.
    ToolCallRequest {
        /// The tool's name.
        tool: String,
    },
    /// A tool call finished.
    ToolCallResponse {
        /// The tool's name.
        tool: String,
        /// Whether it errored.
        is_error: bool,
    },
    /// An LLM call is about to be made.
    LlmRequest {
        /// Model identifier, if known ahead of the call.
        model: Option<String>,
    },
    /// An LLM call returned.
    LlmResponse {
        /// Model identifier.
        model: String,
    },
    /// A new anonymous object was added to the blackboard.
    ObjectAdded {
        /// The domain type name.
        type_name: String,
    },
    /// A name was bound to an object on the blackboard.
    ObjectBound {
        /// The bound name.
        name: String,
        /// The domain type name.
        type_name: String,
    },
    /// A goal's preconditions were satisfied.
    GoalAchieved {
        /// The goal's name.
        goal: String,
    },
    /// The process reached a terminal state.
    ProcessFinished {
        /// Final status, as its `snake_case` name.
        status: String,
    },
    /// The process transitioned to `Waiting`.
    ProcessWaiting,
    /// The process transitioned to `Paused`.
    ProcessPaused,
    /// The planner found no plan; process transitioned to `Stuck`.
    ProcessStuck,
    /// An early-termination policy tripped.
    EarlyTermination {
        /// Which policy tripped (`max_actions`, `max_wall_clock`, `max_cost`).
        policy: String,
    },
    /// A free-form progress update, e.g. from a long-running tool.
    ProgressUpdate {
        /// Human-readable message.
        message: String,
    },
}

/// An event published on the bus. Every event carries `process_id` and
/// `timestamp`, per §4.5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The process this event describes.
    pub process_id: ProcessId,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// The event's payload.
    pub kind: EventKind,
}

impl Event {
    /// Construct an event stamped with the current time.
    pub fn new(process_id: ProcessId, kind: EventKind) -> Self {
        Self {
            process_id,
            timestamp: now_millis(),
            kind,
        }
    }
}
