#![deny(missing_docs)]
//! In-memory implementation of [`ProcessStore`] and [`AwaitableStore`].
//!
//! Two `HashMap`s behind independent `RwLock`s, keyed by the id's raw
//! string. Suitable for testing, prototyping, and single-process use
//! cases where persistence across restarts is not required.

use agentex_core::error::StoreError;
use agentex_core::store::{AwaitableStore, ProcessStore};
use agentex_core::{AwaitableId, ProcessId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory store backed by a `HashMap` behind a `RwLock`.
pub struct MemoryStore {
    processes: RwLock<HashMap<String, serde_json::Value>>,
    awaitables: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            processes: RwLock::new(HashMap::new()),
            awaitables: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessStore for MemoryStore {
    async fn save(&self, id: &ProcessId, state: serde_json::Value) -> Result<(), StoreError> {
        self.processes.write().await.insert(id.as_str().to_string(), state);
        Ok(())
    }

    async fn load(&self, id: &ProcessId) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.processes.read().await.get(id.as_str()).cloned())
    }

    async fn delete(&self, id: &ProcessId) -> Result<(), StoreError> {
        self.processes.write().await.remove(id.as_str());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProcessId>, StoreError> {
        Ok(self.processes.read().await.keys().map(|k| ProcessId::new(k.clone())).collect())
    }
}

#[async_trait]
impl AwaitableStore for MemoryStore {
    async fn save(&self, id: &AwaitableId, state: serde_json::Value) -> Result<(), StoreError> {
        self.awaitables.write().await.insert(id.as_str().to_string(), state);
        Ok(())
    }

    async fn load(&self, id: &AwaitableId) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.awaitables.read().await.get(id.as_str()).cloned())
    }

    async fn delete(&self, id: &AwaitableId) -> Result<(), StoreError> {
        self.awaitables.write().await.remove(id.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn process_write_then_read_roundtrips() {
        let store = MemoryStore::new();
        let id = ProcessId::new("p1");
        ProcessStore::save(&store, &id, json!({"status": "running"})).await.unwrap();
        let loaded = ProcessStore::load(&store, &id).await.unwrap();
        assert_eq!(loaded, Some(json!({"status": "running"})));
    }

    #[tokio::test]
    async fn process_load_missing_returns_none() {
        let store = MemoryStore::new();
        let loaded = ProcessStore::load(&store, &ProcessId::new("missing")).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn process_delete_removes_entry() {
        let store = MemoryStore::new();
        let id = ProcessId::new("p1");
        ProcessStore::save(&store, &id, json!("x")).await.unwrap();
        ProcessStore::delete(&store, &id).await.unwrap();
        assert_eq!(ProcessStore::load(&store, &id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn process_list_returns_all_saved_ids() {
        let store = MemoryStore::new();
        ProcessStore::save(&store, &ProcessId::new("p1"), json!("a")).await.unwrap();
        ProcessStore::save(&store, &ProcessId::new("p2"), json!("b")).await.unwrap();
        let mut ids: Vec<String> = ProcessStore::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["p1".to_string(), "p2".to_string()]);
    }

    #[tokio::test]
    async fn awaitables_are_isolated_from_processes() {
        let store = MemoryStore::new();
        let shared_id = "shared";
        ProcessStore::save(&store, &ProcessId::new(shared_id), json!("process-state")).await.unwrap();
        AwaitableStore::save(&store, &AwaitableId::new(shared_id), json!("awaitable-state"))
            .await
            .unwrap();

        let process_state = ProcessStore::load(&store, &ProcessId::new(shared_id)).await.unwrap();
        let awaitable_state = AwaitableStore::load(&store, &AwaitableId::new(shared_id)).await.unwrap();
        assert_eq!(process_state, Some(json!("process-state")));
        assert_eq!(awaitable_state, Some(json!("awaitable-state")));
    }

    #[tokio::test]
    async fn awaitable_delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = AwaitableId::new("a1");
        AwaitableStore::delete(&store, &id).await.unwrap();
        AwaitableStore::save(&store, &id, json!("x")).await.unwrap();
        AwaitableStore::delete(&store, &id).await.unwrap();
        AwaitableStore::delete(&store, &id).await.unwrap();
        assert_eq!(AwaitableStore::load(&store, &id).await.unwrap(), None);
    }
}
