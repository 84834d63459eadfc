//! Utility planner (§4.2b) — greedy net-value selection, no lookahead.

use agentex_core::{Agent, PlannerError, WorldState};
use rust_decimal::Decimal;

use crate::{first_achieved_goal, Plan, PlanOutcome, Planner};

/// Picks, at each cycle, the applicable action with the greatest net
/// value (`value - cost`) at the current world state. Ties broken
/// lexicographically by action name. Emits a single-step plan; the
/// executor re-invokes the planner after every action completes.
#[derive(Debug, Default)]
pub struct UtilityPlanner;

impl UtilityPlanner {
    /// Construct a utility planner.
    pub fn new() -> Self {
        Self
    }
}

impl Planner for UtilityPlanner {
    fn plan(&self, agent: &Agent, world_state: &WorldState) -> Result<PlanOutcome, PlannerError> {
        if let Some(goal) = first_achieved_goal(&agent.goals, world_state) {
            tracing::debug!(discipline = "utility", plan_len = 0, "goal already achieved");
            return Ok(PlanOutcome::GoalAlreadyAchieved(goal.name.clone()));
        }

        let best = agent
            .actions
            .iter()
            .filter(|a| a.is_selectable(world_state))
            .map(|a| {
                let net = (a.value)(world_state) - (a.cost)(world_state);
                (net, a)
            })
            .fold(None::<(Decimal, &agentex_core::Action)>, |acc, (net, action)| {
                match acc {
                    None => Some((net, action)),
                    Some((best_net, best_action)) => {
                        if net > best_net || (net == best_net && action.name < best_action.name) {
                            Some((net, action))
                        } else {
                            Some((best_net, best_action))
                        }
                    }
                }
            });

        match best {
            Some((_, action)) => {
                tracing::debug!(discipline = "utility", plan_len = 1, action = %action.name, "planning cycle complete");
                Ok(PlanOutcome::Plan(Plan::single(action.name.clone())))
            }
            None => {
                tracing::debug!(discipline = "utility", plan_len = 0, "planner stuck, no applicable action");
                Ok(PlanOutcome::Stuck)
            }
        }
    }
}
