//! C2 — Blackboard: the typed, append-oriented shared memory (§4.1).

use crate::value::{DomainValue, TypeRegistry};
use serde::{Deserialize, Serialize};

/// A single object entry on the blackboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Monotonic id, stable across `hide`/`spawn`.
    pub id: u64,
    /// The domain type name this value was tagged with at insertion.
    pub type_name: String,
    /// The value itself.
    pub value: serde_json::Value,
    /// Hidden values are excluded from `objects()` but retrievable by id.
    pub hidden: bool,
}

/// Ordered, typed store of values and boolean conditions for one agent
/// process. See §4.1 for the full contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blackboard {
    objects: Vec<ObjectEntry>,
    /// name -> object id. `bind` overwrites this on each call; the
    /// superseded object stays in `objects` for history ("both kept,
    /// latest wins on lookup" — §9 open question, resolved).
    names: std::collections::HashMap<String, u64>,
    conditions: std::collections::HashMap<String, bool>,
    next_id: u64,
}

impl Blackboard {
    /// An empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `v` as an anonymous object and point `name` at it. Both the
    /// new object and any prior object previously bound to `name` remain
    /// in `objects()`.
    pub fn bind(&mut self, name: impl Into<String>, type_name: impl Into<String>, v: serde_json::Value) -> u64 {
        let id = self.add_object(type_name, v);
        self.names.insert(name.into(), id);
        id
    }

    /// Typed convenience over [`Blackboard::bind`] for reflected domain values.
    pub fn bind_typed<T: DomainValue>(&mut self, name: impl Into<String>, v: &T) -> u64 {
        let json = serde_json::to_value(v).expect("DomainValue must serialize");
        self.bind(name, T::domain_type_name(), json)
    }

    /// Append `v` as an anonymous object. No name is associated.
    pub fn add_object(&mut self, type_name: impl Into<String>, v: serde_json::Value) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.push(ObjectEntry {
            id,
            type_name: type_name.into(),
            value: v,
            hidden: false,
        });
        id
    }

    /// Typed convenience over [`Blackboard::add_object`].
    pub fn add_object_typed<T: DomainValue>(&mut self, v: &T) -> u64 {
        let json = serde_json::to_value(v).expect("DomainValue must serialize");
        self.add_object(T::domain_type_name(), json)
    }

    /// Resolve a name to its most recently bound object.
    pub fn get(&self, name: &str) -> Option<&ObjectEntry> {
        let id = *self.names.get(name)?;
        self.objects.iter().find(|o| o.id == id)
    }

    /// The most recently inserted visible object assignable to `type_name`,
    /// walking `objects()` in reverse.
    pub fn last(&self, type_name: &str, registry: &TypeRegistry) -> Option<&ObjectEntry> {
        self.objects
            .iter()
            .rev()
            .find(|o| !o.hidden && registry.is_assignable(&o.type_name, type_name))
    }

    /// Snapshot of all visible (non-hidden) objects in insertion order.
    pub fn objects(&self) -> Vec<&ObjectEntry> {
        self.objects.iter().filter(|o| !o.hidden).collect()
    }

    /// Set a condition. Idempotent, independent of objects.
    pub fn set_condition(&mut self, name: impl Into<String>, value: bool) {
        self.conditions.insert(name.into(), value);
    }

    /// Read a condition's current value, if set.
    pub fn get_condition(&self, name: &str) -> Option<bool> {
        self.conditions.get(name).copied()
    }

    /// All set conditions.
    pub fn conditions(&self) -> &std::collections::HashMap<String, bool> {
        &self.conditions
    }

    /// A child blackboard seeded with a snapshot of this one. Writes to
    /// the child do not affect the parent (the child owns its own
    /// `Vec`/`HashMap`, cloned at spawn time).
    pub fn spawn(&self) -> Blackboard {
        self.clone()
    }

    /// Remove all objects and conditions. Ids continue from where they
    /// left off — `clear` is a content reset, not an identity reset.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.names.clear();
        self.conditions.clear();
    }

    /// Mark an object invisible to `objects()`/`last()` without deleting
    /// it. It remains retrievable by id via [`Blackboard::get_by_id`].
    pub fn hide(&mut self, id: u64) {
        if let Some(entry) = self.objects.iter_mut().find(|o| o.id == id) {
            entry.hidden = true;
        }
    }

    /// Retrieve an object by id regardless of hidden status.
    pub fn get_by_id(&self, id: u64) -> Option<&ObjectEntry> {
        self.objects.iter().find(|o| o.id == id)
    }
}
