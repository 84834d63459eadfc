//! Persistence — opaque key-value storage for processes and awaitables.
//!
//! The platform needs exactly two durable collections: agent processes
//! (keyed by [`ProcessId`]) and awaitables (keyed by [`AwaitableId`]).
//! Both traits are deliberately minimal CRUD — no search, no versioning,
//! no transactions. Implementations are expected to serialize whatever
//! the caller hands them and round-trip it unmodified: at-least-once
//! retrieval, no partial writes.

use crate::error::StoreError;
use crate::id::{AwaitableId, ProcessId};
use async_trait::async_trait;

/// Opaque persistence for agent process state.
///
/// The executor serializes whatever subset of a process it wants durable
/// into `serde_json::Value` before calling [`ProcessStore::save`]; this
/// trait doesn't know the shape.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Persist (or overwrite) the process state under its id.
    async fn save(&self, id: &ProcessId, state: serde_json::Value) -> Result<(), StoreError>;

    /// Load a process's persisted state, if any.
    async fn load(&self, id: &ProcessId) -> Result<Option<serde_json::Value>, StoreError>;

    /// Remove a process's persisted state.
    async fn delete(&self, id: &ProcessId) -> Result<(), StoreError>;

    /// List ids of all persisted processes.
    async fn list(&self) -> Result<Vec<ProcessId>, StoreError>;
}

/// Opaque persistence for suspended awaitables (§4.6, §6 "Persistence").
///
/// Only awaitables marked `persistent` are required to round-trip
/// through this store; ephemeral ones may live purely in memory on the
/// executor that raised them.
#[async_trait]
pub trait AwaitableStore: Send + Sync {
    /// Persist an awaitable under its id.
    async fn save(&self, id: &AwaitableId, state: serde_json::Value) -> Result<(), StoreError>;

    /// Load a persisted awaitable, if any.
    async fn load(&self, id: &AwaitableId) -> Result<Option<serde_json::Value>, StoreError>;

    /// Remove a persisted awaitable (called once it has been responded to).
    async fn delete(&self, id: &AwaitableId) -> Result<(), StoreError>;
}
