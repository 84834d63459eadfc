//! C1 — Typed Value Registry.
//!
//! A structural description of the domain types flowing through a
//! blackboard: enough for the planner to reason about assignability and
//! for an LLM-facing schema to be emitted, without requiring every
//! domain type to be a Rust type known at the registry's compile time.

use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a domain type is backed.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTypeKind {
    /// Backed by a concrete Rust type implementing [`DomainValue`].
    Reflected,
    /// Schema-only — described structurally, with no backing Rust type.
    Dynamic,
}

/// A property descriptor on a domain type.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyDescriptor {
    /// A scalar value (string, number, boolean) identified by name.
    Scalar {
        /// Name of the scalar kind, e.g. "string", "number", "boolean".
        scalar_type: String,
    },
    /// A single related entity, referenced by domain type name.
    Entity {
        /// Name of the referenced domain type.
        type_name: String,
    },
    /// A collection of related entities.
    Collection {
        /// Name of the element domain type.
        element_type: String,
    },
}

/// A named handle for a value class flowing through the blackboard.
///
/// Invariant: a type's parent chain is acyclic (enforced at
/// registration time by [`TypeRegistry::register`]).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainType {
    /// Fully qualified type name, unique within a registry.
    pub name: String,
    /// Short display label.
    pub own_label: String,
    /// Human-readable description.
    pub description: String,
    /// Parent type names, nearest first. Assignability walks this chain.
    pub parents: Vec<String>,
    /// Declared properties, name to descriptor.
    pub properties: HashMap<String, PropertyDescriptor>,
    /// Whether the planner/tool loop may construct new instances of
    /// this type on the caller's behalf (vs. only ever binding existing
    /// ones supplied by an action).
    pub creation_permitted: bool,
    /// Reflected or dynamic.
    pub kind: DomainTypeKind,
}

impl DomainType {
    /// Start building a dynamic (schema-only) domain type.
    pub fn dynamic(name: impl Into<String>) -> DomainTypeBuilder {
        DomainTypeBuilder::new(name, DomainTypeKind::Dynamic)
    }

    /// Start building a reflected (Rust-backed) domain type.
    pub fn reflected(name: impl Into<String>) -> DomainTypeBuilder {
        DomainTypeBuilder::new(name, DomainTypeKind::Reflected)
    }
}

/// Builder for [`DomainType`].
pub struct DomainTypeBuilder {
    inner: DomainType,
}

impl DomainTypeBuilder {
    fn new(name: impl Into<String>, kind: DomainTypeKind) -> Self {
        let name = name.into();
        Self {
            inner: DomainType {
                own_label: name.clone(),
                description: String::new(),
                parents: Vec::new(),
                properties: HashMap::new(),
                creation_permitted: true,
                kind,
                name,
            },
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.inner.description = description.into();
        self
    }

    /// Declare a parent type, nearest first.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.inner.parents.push(parent.into());
        self
    }

    /// Declare a property.
    pub fn property(mut self, name: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.inner.properties.insert(name.into(), descriptor);
        self
    }

    /// Forbid the planner/tool loop from creating instances of this type.
    pub fn creation_forbidden(mut self) -> Self {
        self.inner.creation_permitted = false;
        self
    }

    /// Finish building.
    pub fn build(self) -> DomainType {
        self.inner
    }
}

/// A registry of domain types, used by the planner and by LLM schema
/// emission to resolve assignability.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, DomainType>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain type. Rejects cyclic parent chains.
    pub fn register(&mut self, domain_type: DomainType) -> Result<(), ValueError> {
        let name = domain_type.name.clone();
        let mut probe = self.types.clone();
        probe.insert(name.clone(), domain_type.clone());
        if has_cycle(&probe, &name) {
            return Err(ValueError::CyclicParents(name));
        }
        self.types.insert(name, domain_type);
        Ok(())
    }

    /// Look up a registered type by name.
    pub fn get(&self, name: &str) -> Option<&DomainType> {
        self.types.get(name)
    }

    /// Whether `candidate` is assignable to `target`: either the same
    /// name, or `target` appears somewhere in `candidate`'s parent chain.
    ///
    /// Unknown type names are assignable only to themselves (a dynamic
    /// value tagged with a name the registry has never seen is still
    /// comparable by exact name — this lets ad hoc values flow through
    /// the blackboard without mandatory registration).
    pub fn is_assignable(&self, candidate: &str, target: &str) -> bool {
        if candidate == target {
            return true;
        }
        let mut seen = std::collections::HashSet::new();
        self.walk_assignable(candidate, target, &mut seen)
    }

    fn walk_assignable(
        &self,
        candidate: &str,
        target: &str,
        seen: &mut std::collections::HashSet<String>,
    ) -> bool {
        if !seen.insert(candidate.to_string()) {
            return false;
        }
        let Some(ty) = self.types.get(candidate) else {
            return false;
        };
        ty.parents
            .iter()
            .any(|p| p == target || self.walk_assignable(p, target, seen))
    }
}

fn has_cycle(types: &HashMap<String, DomainType>, start: &str) -> bool {
    fn visit(
        types: &HashMap<String, DomainType>,
        node: &str,
        visiting: &mut std::collections::HashSet<String>,
    ) -> bool {
        if !visiting.insert(node.to_string()) {
            return true;
        }
        if let Some(ty) = types.get(node) {
            for parent in &ty.parents {
                if visit(types, parent, visiting) {
                    return true;
                }
            }
        }
        visiting.remove(node);
        false
    }
    let mut visiting = std::collections::HashSet::new();
    visit(types, start, &mut visiting)
}

/// Implemented by Rust types that back a "reflected" domain type,
/// bridging native ergonomics with the registry's structural model.
pub trait DomainValue: serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync {
    /// The registered [`DomainType::name`] this Rust type backs.
    fn domain_type_name() -> &'static str;
}
