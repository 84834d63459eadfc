#![deny(missing_docs)]
//! Filesystem-backed implementation of [`ProcessStore`] and
//! [`AwaitableStore`].
//!
//! Directory layout:
//! ```text
//! root/
//!   processes/
//!     <url-encoded-id>.json
//!   awaitables/
//!     <url-encoded-id>.json
//! ```
//!
//! Suitable for development and single-machine deployments where data
//! must survive process restarts without a database.

use agentex_core::error::StoreError;
use agentex_core::store::{AwaitableStore, ProcessStore};
use agentex_core::{AwaitableId, ProcessId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Filesystem-backed persistence store.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a new filesystem store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    fn dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }
}

/// Encode an id into a safe filename.
fn id_to_filename(id: &str) -> String {
    let mut encoded = String::new();
    for ch in id.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                for byte in ch.to_string().as_bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    format!("{encoded}.json")
}

async fn read(dir: &Path, id: &str) -> Result<Option<serde_json::Value>, StoreError> {
    let path = dir.join(id_to_filename(id));
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => {
            let value = serde_json::from_str(&contents)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::WriteFailed(e.to_string())),
    }
}

async fn write(dir: &Path, id: &str, value: serde_json::Value) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| StoreError::WriteFailed(e.to_string()))?;
    let path = dir.join(id_to_filename(id));
    let contents =
        serde_json::to_string_pretty(&value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    tokio::fs::write(&path, contents).await.map_err(|e| StoreError::WriteFailed(e.to_string()))
}

async fn delete(dir: &Path, id: &str) -> Result<(), StoreError> {
    let path = dir.join(id_to_filename(id));
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::WriteFailed(e.to_string())),
    }
}

#[async_trait]
impl ProcessStore for FsStore {
    async fn save(&self, id: &ProcessId, state: serde_json::Value) -> Result<(), StoreError> {
        write(&self.dir("processes"), id.as_str(), state).await
    }

    async fn load(&self, id: &ProcessId) -> Result<Option<serde_json::Value>, StoreError> {
        read(&self.dir("processes"), id.as_str()).await
    }

    async fn delete(&self, id: &ProcessId) -> Result<(), StoreError> {
        delete(&self.dir("processes"), id.as_str()).await
    }

    async fn list(&self) -> Result<Vec<ProcessId>, StoreError> {
        let dir = self.dir("processes");
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(StoreError::WriteFailed(e.to_string())),
        };

        let mut ids = Vec::new();
        while let Some(entry) =
            entries.next_entry().await.map_err(|e| StoreError::WriteFailed(e.to_string()))?
        {
            if let Some(filename) = entry.file_name().to_str() {
                if let Some(name) = filename.strip_suffix(".json") {
                    ids.push(ProcessId::new(name.to_string()));
                }
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl AwaitableStore for FsStore {
    async fn save(&self, id: &AwaitableId, state: serde_json::Value) -> Result<(), StoreError> {
        write(&self.dir("awaitables"), id.as_str(), state).await
    }

    async fn load(&self, id: &AwaitableId) -> Result<Option<serde_json::Value>, StoreError> {
        read(&self.dir("awaitables"), id.as_str()).await
    }

    async fn delete(&self, id: &AwaitableId) -> Result<(), StoreError> {
        delete(&self.dir("awaitables"), id.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_encoding_handles_odd_characters() {
        for id in ["simple", "proc:1", "has spaces", "emoji🎉"] {
            let filename = id_to_filename(id);
            assert!(filename.ends_with(".json"));
        }
    }

    #[tokio::test]
    async fn process_write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let id = ProcessId::new("p1");

        ProcessStore::save(&store, &id, json!({"status": "running"})).await.unwrap();
        let loaded = ProcessStore::load(&store, &id).await.unwrap();
        assert_eq!(loaded, Some(json!({"status": "running"})));
    }

    #[tokio::test]
    async fn process_read_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let loaded = ProcessStore::load(&store, &ProcessId::new("missing")).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn process_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let id = ProcessId::new("p1");

        ProcessStore::save(&store, &id, json!("x")).await.unwrap();
        ProcessStore::delete(&store, &id).await.unwrap();
        assert_eq!(ProcessStore::load(&store, &id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn process_delete_of_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(ProcessStore::delete(&store, &ProcessId::new("missing")).await.is_ok());
    }

    #[tokio::test]
    async fn process_list_reflects_saved_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        ProcessStore::save(&store, &ProcessId::new("p1"), json!("a")).await.unwrap();
        ProcessStore::save(&store, &ProcessId::new("p2"), json!("b")).await.unwrap();

        let mut ids: Vec<String> =
            ProcessStore::list(&store).await.unwrap().into_iter().map(|id| id.0).collect();
        ids.sort();
        assert_eq!(ids, vec!["p1".to_string(), "p2".to_string()]);
    }

    #[tokio::test]
    async fn list_on_nonexistent_directory_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let ids = ProcessStore::list(&store).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn processes_and_awaitables_use_separate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
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
}
