//! C3 — World-State Projector: derives a [`WorldState`] from the
//! blackboard plus evaluated conditions (§3, §4.3 step 9).

use crate::blackboard::Blackboard;
use crate::value::TypeRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// A map `proposition -> bool`. Propositions are drawn from: "has value
/// of type T", named conditions, "action A has run", and custom
/// predicates registered by the agent.
pub type WorldState = HashMap<String, bool>;

/// Build the `"has_value:<type>"` proposition key.
pub fn has_value_proposition(type_name: &str) -> String {
    format!("has_value:{type_name}")
}

/// Build the `"has_run:<action>"` proposition key.
pub fn has_run_proposition(action_name: &str) -> String {
    format!("has_run:{action_name}")
}

/// A custom predicate registered by the agent: evaluated against the
/// blackboard and contributing one proposition to the world state.
pub type CustomPredicate = Arc<dyn Fn(&Blackboard) -> (String, bool) + Send + Sync>;

/// Projects a [`WorldState`] from a blackboard snapshot.
///
/// `watched_types` are the domain types any declared action/goal binding
/// or output references — the projector only computes `has_value:*`
/// propositions for types actually in use, rather than every type ever
/// registered.
pub struct WorldStateProjector {
    registry: Arc<TypeRegistry>,
    watched_types: Vec<String>,
    custom_predicates: Vec<CustomPredicate>,
}

impl WorldStateProjector {
    /// Create a projector over the given type registry.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            watched_types: Vec::new(),
            custom_predicates: Vec::new(),
        }
    }

    /// Register a domain type whose presence should be tracked.
    pub fn watch_type(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.watched_types.push(type_name.into());
        self
    }

    /// Register a custom predicate contributing an extra proposition.
    pub fn add_custom_predicate(&mut self, predicate: CustomPredicate) -> &mut Self {
        self.custom_predicates.push(predicate);
        self
    }

    /// Project the world state from a blackboard plus the set of actions
    /// that have already run in this process (for "has_run" propositions).
    pub fn project(&self, blackboard: &Blackboard, has_run: &[String]) -> WorldState {
        let mut state = WorldState::new();

        for type_name in &self.watched_types {
            let present = blackboard.last(type_name, &self.registry).is_some();
            state.insert(has_value_proposition(type_name), present);
        }

        for (name, value) in blackboard.conditions() {
            state.insert(name.clone(), *value);
        }

        for action_name in has_run {
            state.insert(has_run_proposition(action_name), true);
        }

        for predicate in &self.custom_predicates {
            let (key, value) = predicate(blackboard);
            state.insert(key, value);
        }

        state
    }
}
