#![deny(missing_docs)]
//! The planner (C5, §4.2) — given a world state, produces the next
//! action to run or a terminal verdict, under one of three disciplines:
//! [`goap::GoapPlanner`] (A* search), [`utility::UtilityPlanner`]
//! (greedy net-value), or [`supervisor::SupervisorPlanner`] (LLM
//! delegation via a synthetic action).
//!
//! None of the three disciplines has a direct analog in the operator
//! crates this workspace descends from — those pick one fixed strategy
//! per operator rather than searching a state space. The planner trait
//! and its three implementations are new, but follow the same shape as
//! the rest of this workspace: a pure descriptor (`Agent`) in, a
//! `thiserror` error enum out, `tracing` spans around the expensive
//! path (GOAP's search), deterministic tie-breaks, and unit tests
//! exercising edge cases rather than round-trips.

pub mod goap;
pub mod supervisor;
pub mod utility;

pub use goap::GoapPlanner;
pub use supervisor::SupervisorPlanner;
pub use utility::UtilityPlanner;

use agentex_core::world::has_value_proposition;
use agentex_core::{Goal, PlannerError, WorldState};

/// An ordered sequence of action names to run. GOAP may return more than
/// one step; utility and supervisor always return exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    /// Action names, in the order they should run.
    pub actions: Vec<String>,
}

impl Plan {
    /// A plan naming a single action.
    pub fn single(action_name: impl Into<String>) -> Self {
        Self {
            actions: vec![action_name.into()],
        }
    }
}

/// What a planning cycle produced (§4.2 invariants; §4.3 step 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// A plan to run.
    Plan(Plan),
    /// No action was selected because some declared goal's `pre` already
    /// holds (and its `outputType`, if any, is already satisfied) in the
    /// current world state. Distinct from `Stuck`: the executor should
    /// treat this as immediate goal achievement rather than failure.
    ///
    /// This can only arise on the very first planning cycle of a process
    /// whose blackboard was seeded with goal-satisfying inputs — the
    /// executor's own goal-detection (§4.3, after step 8) pre-empts every
    /// later cycle before the planner is asked again.
    GoalAlreadyAchieved(String),
    /// No applicable action exists and no goal is satisfied: the process
    /// is stuck.
    Stuck,
}

/// Whether `goal` is fully achieved in `world_state`: its `pre` holds,
/// and — if it declares an `output_type` — the corresponding
/// `has_value:*` proposition also holds.
///
/// Kept here rather than as a method on `agentex_core::Goal` because the
/// `has_value` proposition convention is a planner-level reading of the
/// world state, not part of the goal descriptor's own data.
pub fn goal_achieved(goal: &Goal, world_state: &WorldState) -> bool {
    if !goal.pre_satisfied(world_state) {
        return false;
    }
    match &goal.output_type {
        Some(ty) => world_state.get(&has_value_proposition(ty)).copied().unwrap_or(false),
        None => true,
    }
}

/// Find the first declared goal (in declaration order) already achieved
/// in `world_state`, if any. Exposed for the executor's post-action
/// goal-detection step (§4.3, after step 8), not just this crate's own
/// planning cycles.
pub fn first_achieved_goal<'a>(goals: &'a [Goal], world_state: &WorldState) -> Option<&'a Goal> {
    goals.iter().find(|g| goal_achieved(g, world_state))
}

/// A planning discipline: given an agent's actions/goals and the current
/// world state, decide what runs next.
///
/// Implementations must uphold §4.2's three invariants: never select an
/// action whose `pre` is unsatisfied, never re-select a non-rerunnable
/// action that has already run, and behave deterministically given
/// identical inputs.
pub trait Planner {
    /// Produce the next planning outcome.
    fn plan(&self, agent: &agentex_core::Agent, world_state: &WorldState) -> Result<PlanOutcome, PlannerError>;
}
