//! C4 — Action / Goal / Condition model: pure descriptors (§3, §4 intro).

use crate::awaitable::Awaitable;
use crate::blackboard::Blackboard;
use crate::world::WorldState;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A pair `(optional_name, DomainType)` describing an action's input or
/// output slot. A binding with no name is positional-by-type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    /// Slot name, if this binding is addressed by name rather than position.
    pub name: Option<String>,
    /// The domain type name this slot accepts/produces.
    pub domain_type: String,
}

impl Binding {
    /// A named binding.
    pub fn named(name: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            domain_type: domain_type.into(),
        }
    }

    /// A positional (type-only) binding.
    pub fn positional(domain_type: impl Into<String>) -> Self {
        Self {
            name: None,
            domain_type: domain_type.into(),
        }
    }
}

/// A proposition-level predicate: the world state must have `proposition`
/// mapped to `expected` for the predicate to hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predicate {
    /// The world-state key being tested.
    pub proposition: String,
    /// The expected value.
    pub expected: bool,
}

impl Predicate {
    /// A predicate requiring a value of `type_name` to exist on the blackboard.
    pub fn has_value(type_name: impl Into<String>) -> Self {
        Self {
            proposition: crate::world::has_value_proposition(&type_name.into()),
            expected: true,
        }
    }

    /// A predicate requiring named condition `name` to equal `expected`.
    pub fn condition(name: impl Into<String>, expected: bool) -> Self {
        Self {
            proposition: name.into(),
            expected,
        }
    }

    /// A predicate requiring action `name` to have already run.
    pub fn has_run(action_name: impl Into<String>) -> Self {
        Self {
            proposition: crate::world::has_run_proposition(&action_name.into()),
            expected: true,
        }
    }

    /// Evaluate this predicate against a world state. Missing
    /// propositions are treated as `false`.
    pub fn holds(&self, world_state: &WorldState) -> bool {
        world_state.get(&self.proposition).copied().unwrap_or(false) == self.expected
    }
}

/// A proposition an action's completion makes true or false — §4
/// "post: List<Effect>". Named `PostEffect` to avoid colliding with the
/// unrelated notion of a declared side-effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEffect {
    /// The world-state key being set.
    pub proposition: String,
    /// The value it is set to.
    pub value: bool,
}

impl PostEffect {
    /// An effect setting a named condition.
    pub fn condition(name: impl Into<String>, value: bool) -> Self {
        Self {
            proposition: name.into(),
            value,
        }
    }

    /// An effect asserting a value of `type_name` now exists.
    pub fn has_value(type_name: impl Into<String>) -> Self {
        Self {
            proposition: crate::world::has_value_proposition(&type_name.into()),
            value: true,
        }
    }
}

/// Abstract error kinds an action's QoS envelope can classify as
/// retriable (§7).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Action returned a `Failed` status.
    ActionBusinessFailure,
    /// A thrown error the QoS policy may retry.
    ActionTransientFailure,
    /// Referenced tool name not registered.
    ToolNotFound,
    /// Per-tool deadline exceeded (parallel mode).
    ToolTimeout,
    /// Tool loop iteration cap hit.
    MaxIterationsExceeded,
    /// Guard rejected input/output.
    GuardRailViolation,
    /// Structured output failed schema validation.
    ValidationFailure,
}

/// Retry discipline around an action invocation (§4.3 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QosConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub backoff: crate::DurationMs,
    /// Which error kinds are eligible for retry.
    pub retry_on: HashSet<ErrorKind>,
}

impl Default for QosConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: crate::DurationMs::ZERO,
            retry_on: HashSet::new(),
        }
    }
}

/// Terminal outcome of a single action invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    /// The action completed; its outputs (if any) were written to the
    /// blackboard by the action itself via `ProcessContext`.
    Completed,
    /// The action ran to completion but failed on business terms.
    Failed(String),
}

/// A control-flow signal (§4.3 steps 6–7, §7). These are not ordinary
/// errors: they must propagate past blanket error handling straight to
/// the executor.
#[derive(Debug)]
pub enum ControlSignal {
    /// The action wants the blackboard mutated and the remaining plan
    /// discarded, then planning restarted from the top of the tick.
    ReplanRequested {
        /// Why a replan was requested (recorded in process history).
        reason: String,
        /// Applied to the blackboard before planning restarts.
        updater: BlackboardUpdater,
    },
    /// The action needs external input before it can proceed.
    AwaitableResponse(Awaitable),
    /// Cooperative external termination, checked at tick and call boundaries.
    ProcessKilled,
}

/// A boxed mutation applied to the blackboard when a replan is requested.
pub struct BlackboardUpdater(pub Box<dyn FnOnce(&mut Blackboard) + Send>);

impl std::fmt::Debug for BlackboardUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlackboardUpdater(..)")
    }
}

impl BlackboardUpdater {
    /// Wrap a closure as an updater.
    pub fn new(f: impl FnOnce(&mut Blackboard) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Apply the update.
    pub fn apply(self, blackboard: &mut Blackboard) {
        (self.0)(blackboard)
    }
}

/// An error raised from within an action body — either an ordinary
/// business/transient failure subject to the QoS envelope, or a control
/// signal that must bypass it.
#[derive(Debug)]
pub enum ActionError {
    /// Business failure: the action ran and failed on its own terms.
    /// Never retried, regardless of `qos.retry_on` (§7 "Non-retriable").
    Business(String),
    /// A thrown failure classified as `kind`. Retried under the QoS
    /// envelope iff `kind` is in the action's `qos.retry_on`.
    Transient {
        /// Which error kind this is, checked against `qos.retry_on`.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },
    /// A control-flow signal. Never retried, never treated as failure.
    ControlFlow(ControlSignal),
}

/// Result type returned by [`ActionBody::execute`].
pub type ActionResult = Result<ActionStatus, ActionError>;

/// The body of an action: the actual work, given mutable blackboard
/// access via [`ProcessContext`]. Kept separate from [`Action`]'s
/// descriptor fields (cost, value, pre/post) so the descriptor stays a
/// pure, cheaply-cloned value while the body can close over whatever an
/// agent author needs (an LLM provider, a tool registry, a tool loop —
/// the platform does not mediate those; an action that wants to run an
/// LLM turn owns its own dependencies).
#[async_trait]
pub trait ActionBody: Send + Sync {
    /// Run the action.
    async fn execute(&self, ctx: &mut ProcessContext<'_>) -> ActionResult;
}

/// Mutable access to a process's blackboard, handed to an action body.
/// Writes go through these methods rather than direct blackboard access
/// so that a future implementation could intercept them (auditing,
/// event emission) without changing `ActionBody`'s signature.
pub struct ProcessContext<'a> {
    blackboard: &'a mut Blackboard,
    process_id: crate::id::ProcessId,
    attempt: u32,
}

impl<'a> ProcessContext<'a> {
    /// Construct a context over a process's blackboard.
    pub fn new(blackboard: &'a mut Blackboard, process_id: crate::id::ProcessId, attempt: u32) -> Self {
        Self {
            blackboard,
            process_id,
            attempt,
        }
    }

    /// Read-only view of the blackboard.
    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    /// Bind a named value.
    pub fn bind(&mut self, name: impl Into<String>, type_name: impl Into<String>, value: serde_json::Value) -> u64 {
        self.blackboard.bind(name, type_name, value)
    }

    /// Add an anonymous object.
    pub fn add_object(&mut self, type_name: impl Into<String>, value: serde_json::Value) -> u64 {
        self.blackboard.add_object(type_name, value)
    }

    /// Set a condition.
    pub fn set_condition(&mut self, name: impl Into<String>, value: bool) {
        self.blackboard.set_condition(name, value)
    }

    /// The id of the process this action is running within.
    pub fn process_id(&self) -> &crate::id::ProcessId {
        &self.process_id
    }

    /// Which attempt (1-indexed) of the QoS envelope this invocation is.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Build a `ReplanRequested` control signal as an `ActionError`.
    pub fn replan(
        reason: impl Into<String>,
        updater: impl FnOnce(&mut Blackboard) + Send + 'static,
    ) -> ActionError {
        ActionError::ControlFlow(ControlSignal::ReplanRequested {
            reason: reason.into(),
            updater: BlackboardUpdater::new(updater),
        })
    }

    /// Build an `AwaitableResponse` control signal as an `ActionError`.
    pub fn await_response(awaitable: Awaitable) -> ActionError {
        ActionError::ControlFlow(ControlSignal::AwaitableResponse(awaitable))
    }
}

/// A pure descriptor plus a body: `{ name, description, inputs, outputs,
/// cost, value, pre, post, canRerun, qos, toolGroups, execute }` (§3).
pub struct Action {
    /// Unique name within an agent.
    pub name: String,
    /// Human-readable description, also surfaced to the supervisor planner.
    pub description: String,
    /// Input slots.
    pub inputs: Vec<Binding>,
    /// Output slots.
    pub outputs: Vec<Binding>,
    /// Cost function, evaluated at the current world state.
    pub cost: Arc<dyn Fn(&WorldState) -> Decimal + Send + Sync>,
    /// Value function, evaluated at the current world state.
    pub value: Arc<dyn Fn(&WorldState) -> Decimal + Send + Sync>,
    /// Preconditions that must all hold for this action to be selectable.
    pub pre: Vec<Predicate>,
    /// Propositions this action's completion makes true/false.
    pub post: Vec<PostEffect>,
    /// Whether this action may run more than once in a process.
    pub can_rerun: bool,
    /// Retry discipline.
    pub qos: QosConfig,
    /// Named tool groups this action's body may draw on.
    pub tool_groups: HashSet<String>,
    /// The actual work.
    pub body: Arc<dyn ActionBody>,
}

impl Action {
    /// All post-conditions this action asserts once completed, including
    /// the implicit `has_run:<name>` proposition added for non-rerunnable
    /// actions (§3 "Action").
    pub fn effective_post(&self) -> Vec<PostEffect> {
        let mut post = self.post.clone();
        if !self.can_rerun {
            post.push(PostEffect {
                proposition: crate::world::has_run_proposition(&self.name),
                value: true,
            });
        }
        post
    }

    /// Whether every precondition holds in `world_state`.
    pub fn is_applicable(&self, world_state: &WorldState) -> bool {
        self.pre.iter().all(|p| p.holds(world_state))
    }

    /// Whether this action is selectable: applicable, and — if
    /// non-rerunnable — not already run.
    pub fn is_selectable(&self, world_state: &WorldState) -> bool {
        if !self.can_rerun {
            let already_ran = world_state
                .get(&crate::world::has_run_proposition(&self.name))
                .copied()
                .unwrap_or(false);
            if already_ran {
                return false;
            }
        }
        self.is_applicable(world_state)
    }
}

/// `{ name, description, inputs, outputType, pre, value }` (§3 "Goal").
pub struct Goal {
    /// Unique name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Input slots referenced by the goal's predicates.
    pub inputs: Vec<Binding>,
    /// If present, a value of this type must exist on the blackboard
    /// for the goal to be considered truly achieved.
    pub output_type: Option<String>,
    /// Preconditions that define achievement.
    pub pre: Vec<Predicate>,
    /// Value used by the GOAP heuristic and the utility planner.
    pub value: Decimal,
}

impl Goal {
    /// Whether this goal's `pre` holds in `world_state`.
    pub fn pre_satisfied(&self, world_state: &WorldState) -> bool {
        self.pre.iter().all(|p| p.holds(world_state))
    }
}

/// How a named condition's value is determined (§3 "Condition").
pub enum ConditionKind {
    /// True iff a value of the given type exists on the blackboard.
    Structural { has_value_of: String },
    /// Set directly by an action via `ProcessContext::set_condition`.
    Stored,
    /// Computed on demand by an external evaluator (e.g. a logic engine, §6).
    Computed(Arc<dyn Fn(&WorldState) -> bool + Send + Sync>),
}

/// A named predicate over the world state (§3 "Condition").
pub struct Condition {
    /// The condition's name — also its world-state proposition key.
    pub name: String,
    /// How it's determined.
    pub kind: ConditionKind,
}

/// Immutable bundle: `{ name, provider, version, description, actions,
/// goals, conditions, opaque }` (§3 "Agent").
///
/// Invariant: every action's referenced conditions must be declared, and
/// every goal's `pre` must reference declared conditions. Enforced by
/// [`Agent::validate`] rather than at construction, since descriptors are
/// typically assembled incrementally by a builder.
pub struct Agent {
    /// Agent name.
    pub name: String,
    /// Provider/vendor identifier (free-form, e.g. "local", "acme-corp").
    pub provider: String,
    /// Semantic version string.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Available actions.
    pub actions: Vec<Action>,
    /// Available goals.
    pub goals: Vec<Goal>,
    /// Declared conditions.
    pub conditions: Vec<Condition>,
    /// Opaque, agent-specific metadata not interpreted by the platform.
    pub opaque: serde_json::Value,
}

impl Agent {
    /// Validate that every proposition referenced by an action's `pre`
    /// or a goal's `pre` that names a declared condition is indeed
    /// declared on this agent. Structural (`has_value:*`) and
    /// `has_run:*` propositions are always legal and skip this check.
    pub fn validate(&self) -> Result<(), String> {
        let declared: HashSet<&str> = self.conditions.iter().map(|c| c.name.as_str()).collect();
        let is_structural = |p: &str| p.starts_with("has_value:") || p.starts_with("has_run:");

        for action in &self.actions {
            for pred in &action.pre {
                if !is_structural(&pred.proposition) && !declared.contains(pred.proposition.as_str())
                {
                    return Err(format!(
                        "action '{}' references undeclared condition '{}'",
                        action.name, pred.proposition
                    ));
                }
            }
        }
        for goal in &self.goals {
            for pred in &goal.pre {
                if !is_structural(&pred.proposition) && !declared.contains(pred.proposition.as_str())
                {
                    return Err(format!(
                        "goal '{}' references undeclared condition '{}'",
                        goal.name, pred.proposition
                    ));
                }
            }
        }
        Ok(())
    }
}
