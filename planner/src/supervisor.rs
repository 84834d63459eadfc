//! Supervisor planner (§4.2c) — delegates selection to an LLM.
//!
//! A single synthetic action wraps all of an agent's other actions as
//! tools and lets an LLM pick among them inside the tool loop (C7); the
//! planner's job here is only to keep re-selecting that wrapper action
//! until a goal is achieved or it has already run once (it is expected
//! to be declared non-rerunnable, since a single invocation owns the
//! whole supervised loop internally).

use agentex_core::{Agent, PlannerError, WorldState};

use crate::{first_achieved_goal, Plan, PlanOutcome, Planner};

/// Always proposes a single, configured action name — the synthetic
/// supervisor action the agent author wired the tool loop into.
pub struct SupervisorPlanner {
    supervisor_action_name: String,
}

impl SupervisorPlanner {
    /// Create a planner that delegates to the action named
    /// `supervisor_action_name`. The agent must declare an action with
    /// this name; its body is expected to run a tool loop (C7) over the
    /// agent's other actions.
    pub fn new(supervisor_action_name: impl Into<String>) -> Self {
        Self {
            supervisor_action_name: supervisor_action_name.into(),
        }
    }
}

impl Planner for SupervisorPlanner {
    fn plan(&self, agent: &Agent, world_state: &WorldState) -> Result<PlanOutcome, PlannerError> {
        if let Some(goal) = first_achieved_goal(&agent.goals, world_state) {
            tracing::debug!(discipline = "supervisor", plan_len = 0, "goal already achieved");
            return Ok(PlanOutcome::GoalAlreadyAchieved(goal.name.clone()));
        }

        let action = agent
            .actions
            .iter()
            .find(|a| a.name == self.supervisor_action_name)
            .ok_or_else(|| {
                PlannerError::Other(
                    format!("supervisor action '{}' not declared on agent", self.supervisor_action_name)
                        .into(),
                )
            })?;

        if action.is_selectable(world_state) {
            tracing::debug!(discipline = "supervisor", plan_len = 1, action = %action.name, "planning cycle complete");
            Ok(PlanOutcome::Plan(Plan::single(action.name.clone())))
        } else {
            tracing::debug!(discipline = "supervisor", plan_len = 0, "supervisor action not selectable, stuck");
            Ok(PlanOutcome::Stuck)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentex_core::{Action, ActionBody, ActionResult, ActionStatus, ProcessContext, QosConfig};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct NoopBody;
    #[async_trait]
    impl ActionBody for NoopBody {
        async fn execute(&self, _ctx: &mut ProcessContext<'_>) -> ActionResult {
            Ok(ActionStatus::Completed)
        }
    }

    fn supervisor_action(can_rerun: bool) -> Action {
        Action {
            name: "Supervise".to_string(),
            description: String::new(),
            inputs: vec![],
            outputs: vec![],
            cost: Arc::new(|_| Decimal::ZERO),
            value: Arc::new(|_| Decimal::ZERO),
            pre: vec![],
            post: vec![],
            can_rerun,
            qos: QosConfig::default(),
            tool_groups: HashSet::new(),
            body: Arc::new(NoopBody),
        }
    }

    fn agent_with(actions: Vec<Action>) -> Agent {
        Agent {
            name: "a".into(),
            provider: "local".into(),
            version: "0.1.0".into(),
            description: String::new(),
            actions,
            goals: vec![],
            conditions: vec![],
            opaque: serde_json::Value::Null,
        }
    }

    #[test]
    fn selects_the_configured_supervisor_action() {
        let agent = agent_with(vec![supervisor_action(false)]);
        let planner = SupervisorPlanner::new("Supervise");
        let outcome = planner.plan(&agent, &WorldState::new()).unwrap();
        assert_eq!(outcome, PlanOutcome::Plan(Plan::single("Supervise")));
    }

    #[test]
    fn missing_supervisor_action_is_an_error() {
        let agent = agent_with(vec![]);
        let planner = SupervisorPlanner::new("Supervise");
        assert!(planner.plan(&agent, &WorldState::new()).is_err());
    }

    #[test]
    fn already_run_non_rerunnable_supervisor_is_stuck() {
        let agent = agent_with(vec![supervisor_action(false)]);
        let planner = SupervisorPlanner::new("Supervise");
        let mut world = WorldState::new();
        world.insert(agentex_core::world::has_run_proposition("Supervise"), true);
        let outcome = planner.plan(&agent, &world).unwrap();
        assert_eq!(outcome, PlanOutcome::Stuck);
    }
}
