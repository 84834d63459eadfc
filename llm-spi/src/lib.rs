#![deny(missing_docs)]
//! LLM provider SPI and wire types for agentex (§6 "LLM SPI").
//!
//! This crate defines the internal lingua franca the tool loop and
//! Supervisor planner speak — not provider-specific wire formats.
//! Providers (Anthropic, OpenAI, Ollama, ...) implement [`Provider`] and
//! convert to/from these types at the edge.
//!
//! Key traits defined here:
//! - [`Provider`] — LLM provider interface (not object-safe, uses RPITIT)
//! - [`ContextStrategy`] — context window management, implemented by
//!   `agentex-context`

pub mod config;
pub mod context;
pub mod provider;
pub mod types;

// Re-exports
pub use config::AgentexLlmConfig;
pub use context::{ContextError, ContextStrategy, NoCompaction};
pub use provider::{Provider, ProviderError};
pub use types::*;
