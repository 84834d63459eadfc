//! Agent Process state (§3 "Agent Process", §4.3 status machine).

use crate::awaitable::Awaitable;
use crate::blackboard::Blackboard;
use crate::id::ProcessId;
use crate::DurationMs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The status machine defined in §4.3.
///
/// Grounded in the Initial/Progressed/Terminal layering style used for
/// game-AI action lifecycles: states only move forward within a layer,
/// never backward out of Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Constructed, not yet ticked.
    Ready,
    /// Actively planning/executing.
    Running,
    /// Suspended on an awaitable; resumes on response.
    Waiting,
    /// Suspended by external request; resumes on explicit resume.
    Paused,
    /// Planner returned no plan.
    Stuck,
    /// A goal's `pre` holds and its `outputType` value exists.
    Completed,
    /// An unrecoverable error terminated the process.
    Failed,
    /// Externally killed.
    Killed,
}

impl ProcessStatus {
    /// Whether this status can still transition (false for terminal states).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Completed | ProcessStatus::Failed | ProcessStatus::Killed
        )
    }

    /// Whether the executor should keep ticking this process.
    pub fn should_tick(&self) -> bool {
        matches!(self, ProcessStatus::Ready | ProcessStatus::Running)
    }
}

/// Accumulated token/cost usage. Monotone over a process's lifetime (§8).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens consumed.
    pub prompt_tokens: u64,
    /// Completion tokens produced.
    pub completion_tokens: u64,
    /// Accumulated cost.
    pub cost: Decimal,
}

impl Usage {
    /// Add another usage sample in place.
    pub fn accumulate(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.cost += other.cost;
    }
}

/// One entry in a process's history (§3 "Agent Process" `history`).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// A plan the planner returned.
    Plan {
        /// Action names in execution order.
        actions: Vec<String>,
    },
    /// The result of running one action.
    ActionResult {
        /// The action's name.
        action: String,
        /// Whether it completed, failed, or was retried.
        outcome: String,
        /// Attempts taken (QoS).
        attempts: u32,
    },
    /// A single LLM invocation record.
    LlmInvocation {
        /// Model identifier.
        model: String,
        /// Usage for this one call.
        usage: Usage,
    },
    /// A cumulative usage checkpoint.
    Usage(Usage),
}

/// Early-termination policy thresholds (§4.3, §5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EarlyTermination {
    /// Maximum number of actions to execute.
    pub max_actions: Option<u32>,
    /// Maximum wall-clock runtime.
    pub max_wall_clock: Option<DurationMs>,
    /// Maximum cumulative LLM cost.
    pub max_cost: Option<Decimal>,
}

/// A running instance of an [`crate::model::Agent`] (§3 "Agent Process").
pub struct AgentProcess {
    /// Stable process id.
    pub id: ProcessId,
    /// Parent process id, if this process was spawned by another.
    pub parent_id: Option<ProcessId>,
    /// The process's blackboard.
    pub blackboard: Blackboard,
    /// Current status.
    pub status: ProcessStatus,
    /// Accumulated wall-clock runtime.
    pub running_time: DurationMs,
    /// Ordered history of plans, action results, LLM calls, and usage.
    pub history: Vec<HistoryEntry>,
    /// Names of actions that have already run (non-rerun tracking).
    pub has_run: Vec<String>,
    /// An awaitable currently suspending this process, if status is `Waiting`.
    pub pending_awaitable: Option<Awaitable>,
    /// Cumulative usage across the process's lifetime.
    pub usage: Usage,
    /// Number of ticks the executor has driven this process through.
    /// Telemetry only; the status machine never reads it.
    pub tick: u64,
}

impl AgentProcess {
    /// Start a fresh process seeded with `blackboard`.
    pub fn new(id: ProcessId, blackboard: Blackboard) -> Self {
        Self {
            id,
            parent_id: None,
            blackboard,
            status: ProcessStatus::Ready,
            running_time: DurationMs::ZERO,
            history: Vec::new(),
            has_run: Vec::new(),
            pending_awaitable: None,
            usage: Usage::default(),
            tick: 0,
        }
    }

    /// Record that `action_name` ran, used for `has_run:*` projection.
    pub fn mark_ran(&mut self, action_name: impl Into<String>) {
        self.has_run.push(action_name.into());
    }
}
