#![deny(missing_docs)]
//! Persistence backends (§6 "Persistence") for agentex process and
//! awaitable state.
//!
//! Implements `agentex_core::store::{ProcessStore, AwaitableStore}`:
//! opaque, caller-serialized key-value storage with at-least-once
//! retrieval and no partial writes. Two backends are provided —
//! [`MemoryStore`] for tests and single-process use, [`FsStore`] for
//! persistence across restarts.

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;
