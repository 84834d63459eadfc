#![deny(missing_docs)]
//! The Agent Process Executor (C6, §4.3) — owns a process's lifecycle:
//! plan, evaluate preconditions, run the chosen action under its QoS
//! envelope, write results back to the blackboard, detect goal
//! achievement, and handle suspension for HITL.
//!
//! Like [`agentex_planner`], this crate has no direct analog among the
//! operator crates this workspace descends from: those run one
//! self-contained turn per invocation rather than owning a long-lived,
//! replannable process. The tick loop below is new, but its ambient
//! texture — `thiserror` via `agentex_core::ExecutorError`, `tracing`
//! spans per tick, construction by explicit dependency injection rather
//! than a builder macro — follows the rest of the workspace.

mod qos;

use std::sync::Arc;
use std::time::Instant;

use agentex_core::{
    Action, Agent, AgentProcess, Awaitable, BlackboardUpdater, ControlSignal, DurationMs, EarlyTermination, Event,
    EventKind, HistoryEntry, ProcessId, ProcessStatus, ResponseOutcome, TypeRegistry, WorldState, WorldStateProjector,
};
use agentex_events::EventBus;
use agentex_planner::{PlanOutcome, Planner};
use qos::QosOutcome;
use tracing::Instrument;

pub use agentex_core::ExecutorError;

/// Owns the tick loop for processes running one [`Agent`] under one
/// [`Planner`] discipline.
///
/// Not bound to a single [`AgentProcess`] — a single `Executor` ticks
/// any number of processes of the same agent, one at a time (the
/// concurrency unit is the process, not the executor; see §5 and
/// `agentex-host`).
pub struct Executor {
    agent: Arc<Agent>,
    planner: Box<dyn Planner + Send + Sync>,
    projector: WorldStateProjector,
    events: Option<Arc<EventBus>>,
    early_termination: EarlyTermination,
}

impl Executor {
    /// Construct an executor. `registry` backs blackboard type
    /// assignability checks; watched domain types are derived
    /// automatically from the agent's declared action/goal bindings.
    pub fn new(
        agent: Arc<Agent>,
        registry: Arc<TypeRegistry>,
        planner: Box<dyn Planner + Send + Sync>,
        events: Option<Arc<EventBus>>,
        early_termination: EarlyTermination,
    ) -> Self {
        let mut projector = WorldStateProjector::new(registry);
        for type_name in watched_types(&agent) {
            projector.watch_type(type_name);
        }
        Self {
            agent,
            planner,
            projector,
            events,
            early_termination,
        }
    }

    fn emit(&self, process_id: &ProcessId, kind: EventKind) {
        if let Some(bus) = &self.events {
            bus.publish(Event::new(process_id.clone(), kind));
        }
    }

    fn project(&self, process: &AgentProcess) -> WorldState {
        self.projector.project(&process.blackboard, &process.has_run)
    }

    fn find_action(&self, name: &str) -> Option<&Action> {
        self.agent.actions.iter().find(|a| a.name == name)
    }

    fn check_early_termination(&self, process: &AgentProcess) -> Option<&'static str> {
        if let Some(max) = self.early_termination.max_actions {
            if process.has_run.len() as u32 >= max {
                return Some("max_actions");
            }
        }
        if let Some(max) = self.early_termination.max_wall_clock {
            if process.running_time >= max {
                return Some("max_wall_clock");
            }
        }
        if let Some(max) = self.early_termination.max_cost {
            if process.usage.cost >= max {
                return Some("max_cost");
            }
        }
        None
    }

    fn finish(&self, process: &mut AgentProcess, status: ProcessStatus) {
        process.status = status;
        let label = match status {
            ProcessStatus::Completed => "completed",
            ProcessStatus::Failed => "failed",
            ProcessStatus::Killed => "killed",
            _ => "unknown",
        };
        self.emit(&process.id, EventKind::ProcessFinished { status: label.to_string() });
    }

    /// Drive one tick of the plan-act-observe loop (§4.3 "Per tick").
    ///
    /// Returns once the process reaches a non-ticking status (`Waiting`,
    /// `Paused`, `Stuck`, or a terminal status) or has run one action.
    /// Call repeatedly (see [`Executor::run`]) while
    /// `process.status.should_tick()`.
    pub async fn tick(&self, process: &mut AgentProcess) {
        let tick_started = Instant::now();
        process.tick += 1;
        let span = tracing::span!(
            tracing::Level::INFO,
            "executor.tick",
            process_id = %process.id,
            tick = process.tick,
            status = ?process.status,
        );
        self.tick_inner(process).instrument(span).await;
        process.running_time = DurationMs::from_millis(
            process.running_time.as_millis() + tick_started.elapsed().as_millis() as u64,
        );
    }

    async fn tick_inner(&self, process: &mut AgentProcess) {
        if let Some(policy) = self.check_early_termination(process) {
            tracing::warn!(policy, "early termination policy tripped");
            self.emit(&process.id, EventKind::EarlyTermination { policy: policy.to_string() });
            self.finish(process, ProcessStatus::Failed);
            return;
        }

        process.status = ProcessStatus::Running;

        let world_state = self.project(process);
        self.emit(&process.id, EventKind::ReadyToPlan { world_state: world_state.clone() });

        let outcome = match self.planner.plan(&self.agent, &world_state) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(%error, "planner returned an error");
                self.finish(process, ProcessStatus::Failed);
                return;
            }
        };

        let plan = match outcome {
            PlanOutcome::Stuck => {
                tracing::debug!("planner reports no applicable action; process stuck");
                process.status = ProcessStatus::Stuck;
                self.emit(&process.id, EventKind::ProcessStuck);
                return;
            }
            PlanOutcome::GoalAlreadyAchieved(goal_name) => {
                tracing::debug!(goal = %goal_name, "goal already achieved before planning");
                self.emit(&process.id, EventKind::GoalAchieved { goal: goal_name });
                self.finish(process, ProcessStatus::Completed);
                return;
            }
            PlanOutcome::Plan(plan) => plan,
        };

        let Some(first_action_name) = plan.actions.first().cloned() else {
            // An empty plan with no goal satisfied is not a valid planner
            // output (§4.2 invariants); treat it the same as `Stuck`.
            tracing::warn!("planner returned an empty plan; treating as stuck");
            process.status = ProcessStatus::Stuck;
            self.emit(&process.id, EventKind::ProcessStuck);
            return;
        };

        let Some(action) = self.find_action(&first_action_name) else {
            tracing::warn!(action = %first_action_name, "planned action not declared on agent");
            self.finish(process, ProcessStatus::Failed);
            return;
        };

        // §4.3 step 3: re-check the chosen action's precondition against
        // the state it was planned against. In this single-threaded,
        // one-process-per-tick executor nothing can have mutated the
        // blackboard between planning and here, so a violation means the
        // planner broke its own invariant (i) rather than a genuine race;
        // surfaced as a failure rather than looped, to avoid masking a
        // planner bug with a silent retry.
        if !action.is_applicable(&world_state) {
            tracing::warn!(action = %action.name, "planned action's precondition no longer holds");
            self.finish(process, ProcessStatus::Failed);
            return;
        }

        tracing::debug!(action = %action.name, "action selected, running under QoS");

        self.emit(&process.id, EventKind::PlanFormulated { actions: plan.actions.clone() });
        process.history.push(HistoryEntry::Plan { actions: plan.actions.clone() });
        self.emit(&process.id, EventKind::ActionStart { action: action.name.clone(), attempt: 1 });

        match qos::run_with_qos(action, &process.id, &mut process.blackboard).await {
            QosOutcome::Completed { attempts } => {
                tracing::debug!(action = %action.name, attempts, "action completed");
                process.mark_ran(action.name.clone());
                process.history.push(HistoryEntry::ActionResult {
                    action: action.name.clone(),
                    outcome: "completed".to_string(),
                    attempts,
                });
                self.emit(
                    &process.id,
                    EventKind::ActionResult { action: action.name.clone(), outcome: "completed".to_string() },
                );

                let post_state = self.project(process);
                if let Some(goal) = agentex_planner::first_achieved_goal(&self.agent.goals, &post_state) {
                    tracing::debug!(goal = %goal.name, "goal achieved after action");
                    self.emit(&process.id, EventKind::GoalAchieved { goal: goal.name.clone() });
                    self.finish(process, ProcessStatus::Completed);
                } else {
                    process.status = ProcessStatus::Running;
                }
            }
            QosOutcome::Failed { attempts, error } => {
                tracing::warn!(action = %action.name, attempts, %error, "action failed, exhausted retries");
                process.mark_ran(action.name.clone());
                process.history.push(HistoryEntry::ActionResult {
                    action: action.name.clone(),
                    outcome: format!("failed: {error}"),
                    attempts,
                });
                self.emit(
                    &process.id,
                    EventKind::ActionResult { action: action.name.clone(), outcome: format!("failed: {error}") },
                );
                self.finish(process, ProcessStatus::Failed);
            }
            QosOutcome::ControlFlow { signal, attempts } => match signal {
                ControlSignal::ReplanRequested { reason, updater } => {
                    tracing::debug!(action = %action.name, %reason, "replan requested");
                    updater.apply(&mut process.blackboard);
                    process.history.push(HistoryEntry::ActionResult {
                        action: action.name.clone(),
                        outcome: format!("replan requested: {reason}"),
                        attempts,
                    });
                    self.emit(
                        &process.id,
                        EventKind::ActionResult {
                            action: action.name.clone(),
                            outcome: format!("replan requested: {reason}"),
                        },
                    );
                    process.status = ProcessStatus::Running;
                }
                ControlSignal::AwaitableResponse(awaitable) => {
                    tracing::debug!(action = %action.name, "process suspended on awaitable");
                    process.pending_awaitable = Some(awaitable);
                    process.status = ProcessStatus::Waiting;
                    self.emit(&process.id, EventKind::ProcessWaiting);
                }
                ControlSignal::ProcessKilled => {
                    tracing::warn!(action = %action.name, "process killed mid-action");
                    self.finish(process, ProcessStatus::Killed);
                }
            },
        }
    }

    /// Tick repeatedly until the process stops ticking on its own
    /// (`Waiting`, `Paused`, `Stuck`, or a terminal status).
    pub async fn run(&self, process: &mut AgentProcess) {
        while process.status.should_tick() {
            self.tick(process).await;
        }
    }

    /// Resume a `Waiting` process after its pending awaitable has been
    /// answered (§4.6).
    ///
    /// `updater` is `Some` when the response updates the blackboard
    /// (`ResponseOutcome::Updated`), `None` when it does not
    /// (`ResponseOutcome::Unchanged`). Either way the process
    /// transitions back to `Running` and is re-driven on the next
    /// `tick`/`run` call — §4.6 describes the transition as
    /// unconditional; only the blackboard mutation is conditional on
    /// the outcome.
    pub fn resume(&self, process: &mut AgentProcess, updater: Option<BlackboardUpdater>) -> ResponseOutcome {
        let outcome = match updater {
            Some(updater) => {
                updater.apply(&mut process.blackboard);
                ResponseOutcome::Updated
            }
            None => ResponseOutcome::Unchanged,
        };
        process.pending_awaitable = None;
        process.status = ProcessStatus::Running;
        outcome
    }

    /// The awaitable currently suspending `process`, if any.
    pub fn pending_awaitable<'a>(&self, process: &'a AgentProcess) -> Option<&'a Awaitable> {
        process.pending_awaitable.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentex_core::{
        ActionBody, ActionError, ActionResult, ActionStatus, Awaitable, AwaitableKind, Blackboard, Condition,
        ConditionKind, ErrorKind, Goal, PostEffect, Predicate, ProcessContext, QosConfig, TypeRegistry,
    };
    use agentex_planner::{GoapPlanner, SupervisorPlanner, UtilityPlanner};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

    struct SetCondition {
        name: &'static str,
    }
    #[async_trait]
    impl ActionBody for SetCondition {
        async fn execute(&self, ctx: &mut ProcessContext<'_>) -> ActionResult {
            ctx.set_condition(self.name, true);
            Ok(ActionStatus::Completed)
        }
    }

    fn set_condition_action(name: &str, pre: Vec<Predicate>, sets: &'static str) -> Action {
        Action {
            name: name.to_string(),
            description: String::new(),
            inputs: vec![],
            outputs: vec![],
            cost: Arc::new(|_| Decimal::ONE),
            value: Arc::new(|_| Decimal::ZERO),
            pre,
            post: vec![PostEffect::condition(sets, true)],
            can_rerun: false,
            qos: QosConfig::default(),
            tool_groups: HashSet::new(),
            body: Arc::new(SetCondition { name: sets }),
        }
    }

    fn goal(name: &str, condition: &str) -> Goal {
        Goal {
            name: name.to_string(),
            description: String::new(),
            inputs: vec![],
            output_type: None,
            pre: vec![Predicate::condition(condition, true)],
            value: Decimal::ONE,
        }
    }

    fn agent_with(actions: Vec<Action>, goals: Vec<Goal>, conditions: Vec<Condition>) -> Arc<Agent> {
        Arc::new(Agent {
            name: "a".into(),
            provider: "local".into(),
            version: "0.1.0".into(),
            description: String::new(),
            actions,
            goals,
            conditions,
            opaque: serde_json::Value::Null,
        })
    }

    fn stored(name: &str) -> Condition {
        Condition { name: name.to_string(), kind: ConditionKind::Stored }
    }

    #[tokio::test]
    async fn goap_two_action_plan_completes() {
        let fetch = set_condition_action("Fetch", vec![], "fetched");
        let summarize = set_condition_action("Summarize", vec![Predicate::condition("fetched", true)], "summarized");
        let agent = agent_with(
            vec![fetch, summarize],
            vec![goal("Done", "summarized")],
            vec![stored("fetched"), stored("summarized")],
        );
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(GoapPlanner::default()),
            None,
            EarlyTermination::default(),
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Completed);
        assert_eq!(process.has_run, vec!["Fetch".to_string(), "Summarize".to_string()]);
    }

    #[tokio::test]
    async fn utility_with_no_satisfiable_goal_gets_stuck() {
        let agent = agent_with(vec![], vec![goal("Done", "never")], vec![stored("never")]);
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(UtilityPlanner::new()),
            None,
            EarlyTermination::default(),
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Stuck);
    }

    struct FlakyOnceBody {
        calls: AtomicU32,
    }
    #[async_trait]
    impl ActionBody for FlakyOnceBody {
        async fn execute(&self, ctx: &mut ProcessContext<'_>) -> ActionResult {
            let n = self.calls.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            if n == 1 {
                return Err(ActionError::Transient {
                    kind: ErrorKind::ActionTransientFailure,
                    message: "flaked once".to_string(),
                });
            }
            ctx.set_condition("summarized", true);
            Ok(ActionStatus::Completed)
        }
    }

    fn flaky_action(max_attempts: u32) -> Action {
        let mut retry_on = HashSet::new();
        retry_on.insert(ErrorKind::ActionTransientFailure);
        Action {
            name: "Flaky".to_string(),
            description: String::new(),
            inputs: vec![],
            outputs: vec![],
            cost: Arc::new(|_| Decimal::ONE),
            value: Arc::new(|_| Decimal::ZERO),
            pre: vec![],
            post: vec![PostEffect::condition("summarized", true)],
            can_rerun: false,
            qos: QosConfig { max_attempts, backoff: DurationMs::ZERO, retry_on },
            tool_groups: HashSet::new(),
            body: Arc::new(FlakyOnceBody { calls: AtomicU32::new(0) }),
        }
    }

    #[tokio::test]
    async fn qos_retry_succeeds_on_second_attempt() {
        let agent = agent_with(vec![flaky_action(2)], vec![goal("Done", "summarized")], vec![stored("summarized")]);
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(UtilityPlanner::new()),
            None,
            EarlyTermination::default(),
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Completed);
        let last_result = process
            .history
            .iter()
            .rev()
            .find_map(|entry| match entry {
                HistoryEntry::ActionResult { action, outcome, attempts } if action == "Flaky" => {
                    Some((outcome.clone(), *attempts))
                }
                _ => None,
            })
            .expect("a recorded result for Flaky");
        assert_eq!(last_result, ("completed".to_string(), 2));
    }

    #[tokio::test]
    async fn qos_retry_exhausted_fails_after_one_attempt() {
        let agent = agent_with(vec![flaky_action(1)], vec![goal("Done", "summarized")], vec![stored("summarized")]);
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(UtilityPlanner::new()),
            None,
            EarlyTermination::default(),
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Failed);
        assert_eq!(process.has_run, vec!["Flaky".to_string()]);
    }

    struct AskConfirmation;
    #[async_trait]
    impl ActionBody for AskConfirmation {
        async fn execute(&self, ctx: &mut ProcessContext<'_>) -> ActionResult {
            if ctx.blackboard().get_condition("confirmed") == Some(true) {
                ctx.set_condition("summarized", true);
                return Ok(ActionStatus::Completed);
            }
            Err(ProcessContext::await_response(Awaitable::new(
                "a1",
                AwaitableKind::Confirmation,
                serde_json::json!({"question": "proceed?"}),
            )))
        }
    }

    fn confirm_action() -> Action {
        Action {
            name: "Confirm".to_string(),
            description: String::new(),
            inputs: vec![],
            outputs: vec![],
            cost: Arc::new(|_| Decimal::ONE),
            value: Arc::new(|_| Decimal::ZERO),
            pre: vec![],
            post: vec![PostEffect::condition("summarized", true)],
            can_rerun: true,
            qos: QosConfig::default(),
            tool_groups: HashSet::new(),
            body: Arc::new(AskConfirmation),
        }
    }

    #[tokio::test]
    async fn confirmation_awaitable_suspends_and_resumes() {
        let agent = agent_with(vec![confirm_action()], vec![goal("Done", "summarized")], vec![stored("summarized")]);
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(UtilityPlanner::new()),
            None,
            EarlyTermination::default(),
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Waiting);
        assert!(executor.pending_awaitable(&process).is_some());

        let outcome = executor.resume(
            &mut process,
            Some(BlackboardUpdater::new(|bb| bb.set_condition("confirmed", true))),
        );
        assert_eq!(outcome, ResponseOutcome::Updated);
        assert_eq!(process.status, ProcessStatus::Running);
        assert!(executor.pending_awaitable(&process).is_none());

        executor.run(&mut process).await;
        assert_eq!(process.status, ProcessStatus::Completed);
    }

    #[tokio::test]
    async fn supervisor_planner_always_reproposes_its_action() {
        let action = set_condition_action("Ask", vec![], "summarized");
        let agent = agent_with(vec![action], vec![goal("Done", "summarized")], vec![stored("summarized")]);
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(SupervisorPlanner::new("Ask")),
            None,
            EarlyTermination::default(),
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Completed);
        assert_eq!(process.has_run, vec!["Ask".to_string()]);
    }

    #[tokio::test]
    async fn max_actions_early_termination_fails_before_planning() {
        let action = set_condition_action("Fetch", vec![], "fetched");
        let agent = agent_with(vec![action], vec![goal("Done", "fetched")], vec![stored("fetched")]);
        let executor = Executor::new(
            agent,
            Arc::new(TypeRegistry::new()),
            Box::new(UtilityPlanner::new()),
            None,
            EarlyTermination { max_actions: Some(0), max_wall_clock: None, max_cost: None },
        );
        let mut process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
        executor.run(&mut process).await;

        assert_eq!(process.status, ProcessStatus::Failed);
        assert!(process.has_run.is_empty());
    }
}

fn watched_types(agent: &Agent) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut types = Vec::new();
    let mut note = |t: &str| {
        if seen.insert(t.to_string()) {
            types.push(t.to_string());
        }
    };
    for action in &agent.actions {
        for binding in action.inputs.iter().chain(action.outputs.iter()) {
            note(&binding.domain_type);
        }
    }
    for goal in &agent.goals {
        if let Some(ty) = &goal.output_type {
            note(ty);
        }
        for binding in &goal.inputs {
            note(&binding.domain_type);
        }
    }
    types
}
