//! GOAP planner (§4.2a) — A* search over world states.
//!
//! The search space is implicit: a node is a [`WorldState`] snapshot,
//! edges are applicable actions, and successors are computed by
//! applying `Action::effective_post`. There is no pre-built graph to
//! hand to a library search routine, so this is the textbook
//! `BinaryHeap`-backed A* (the same shape as `std`'s own documented
//! Dijkstra example): an open list ordered by `f = g + h`, a closed set
//! keyed by a canonical state snapshot, and parent pointers for plan
//! reconstruction.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use agentex_core::{Agent, PlannerError, WorldState};
use rust_decimal::Decimal;

use crate::{first_achieved_goal, goal_achieved, Plan, PlanOutcome, Planner};

/// Search limits for [`GoapPlanner`].
#[derive(Debug, Clone, Copy)]
pub struct GoapConfig {
    /// Maximum number of node expansions before giving up (§4.2a).
    pub node_budget: usize,
}

impl Default for GoapConfig {
    fn default() -> Self {
        Self { node_budget: 10_000 }
    }
}

/// A* planner over the world-state space induced by an agent's actions.
pub struct GoapPlanner {
    config: GoapConfig,
}

impl GoapPlanner {
    /// Create a planner with the given search limits.
    pub fn new(config: GoapConfig) -> Self {
        Self { config }
    }
}

impl Default for GoapPlanner {
    fn default() -> Self {
        Self::new(GoapConfig::default())
    }
}

struct Node {
    state: WorldState,
    g: Decimal,
    parent: Option<usize>,
    action_taken: Option<String>,
}

struct Entry {
    f: Decimal,
    action_name: String,
    seq: u64,
    node_idx: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.action_name == other.action_name && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse `f` so the lowest f-score
        // pops first. Ties broken lexicographically by the action name
        // that produced this node, then by insertion order (§4.2
        // "deterministic given identical inputs").
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.action_name.cmp(&self.action_name).reverse())
            .then_with(|| other.seq.cmp(&self.seq).reverse())
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn canonical(state: &WorldState) -> BTreeMap<String, bool> {
    state.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// Number of unsatisfied propositions for the nearest (by unsatisfied
/// count) declared goal — the GOAP heuristic (§4.2a).
fn heuristic(agent: &Agent, state: &WorldState) -> Decimal {
    agent
        .goals
        .iter()
        .map(|goal| {
            goal.pre
                .iter()
                .filter(|p| !p.holds(state))
                .count()
        })
        .min()
        .map(|n| Decimal::from(n as u64))
        .unwrap_or(Decimal::ZERO)
}

impl Planner for GoapPlanner {
    fn plan(&self, agent: &Agent, world_state: &WorldState) -> Result<PlanOutcome, PlannerError> {
        let span = tracing::info_span!("goap.search", node_budget = self.config.node_budget);
        let _guard = span.enter();

        if let Some(goal) = first_achieved_goal(&agent.goals, world_state) {
            tracing::debug!(discipline = "goap", plan_len = 0, "goal already achieved");
            return Ok(PlanOutcome::GoalAlreadyAchieved(goal.name.clone()));
        }

        let mut nodes: Vec<Node> = vec![Node {
            state: world_state.clone(),
            g: Decimal::ZERO,
            parent: None,
            action_taken: None,
        }];
        let mut best_g: HashMap<BTreeMap<String, bool>, Decimal> =
            HashMap::from([(canonical(world_state), Decimal::ZERO)]);
        let mut open: BinaryHeap<Entry> = BinaryHeap::new();
        open.push(Entry {
            f: heuristic(agent, world_state),
            action_name: String::new(),
            seq: 0,
            node_idx: 0,
        });
        let mut seq: u64 = 1;
        let mut expansions: usize = 0;

        while let Some(entry) = open.pop() {
            let node_idx = entry.node_idx;
            let state = nodes[node_idx].state.clone();

            if first_achieved_goal(&agent.goals, &state).is_some() {
                let plan = reconstruct(&nodes, node_idx);
                tracing::debug!(discipline = "goap", plan_len = plan.actions.len(), "planning cycle complete");
                return Ok(PlanOutcome::Plan(plan));
            }

            expansions += 1;
            if expansions > self.config.node_budget {
                tracing::warn!(node_budget = self.config.node_budget, "goap node budget exhausted");
                return Err(PlannerError::NodeBudgetExceeded(self.config.node_budget));
            }

            let mut applicable: Vec<&agentex_core::Action> = agent
                .actions
                .iter()
                .filter(|a| a.is_selectable(&state))
                .collect::<Vec<&agentex_core::Action>>();
            applicable.sort_by(|a, b| a.name.cmp(&b.name));

            for action in applicable {
                let raw_cost = (action.cost)(&state) - (action.value)(&state);
                let new_g = (nodes[node_idx].g + raw_cost).max(Decimal::ZERO);

                let mut new_state = state.clone();
                for effect in action.effective_post() {
                    new_state.insert(effect.proposition, effect.value);
                }
                let key = canonical(&new_state);

                if let Some(&existing) = best_g.get(&key) {
                    if existing <= new_g {
                        continue;
                    }
                }
                best_g.insert(key, new_g);

                let new_idx = nodes.len();
                nodes.push(Node {
                    state: new_state.clone(),
                    g: new_g,
                    parent: Some(node_idx),
                    action_taken: Some(action.name.clone()),
                });
                open.push(Entry {
                    f: new_g + heuristic(agent, &new_state),
                    action_name: action.name.clone(),
                    seq,
                    node_idx: new_idx,
                });
                seq += 1;
            }
        }

        tracing::debug!(discipline = "goap", plan_len = 0, "planner stuck, no path found");
        Ok(PlanOutcome::Stuck)
    }
}

fn reconstruct(nodes: &[Node], mut idx: usize) -> Plan {
    let mut actions = Vec::new();
    while let Some(parent) = nodes[idx].parent {
        actions.push(nodes[idx].action_taken.clone().expect("non-root node has an action"));
        idx = parent;
    }
    actions.reverse();
    Plan { actions }
}
