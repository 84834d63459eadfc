//! Context strategy for managing the conversation window.
//!
//! The [`ContextStrategy`] trait handles client-side context compaction.
//! Provider-native truncation (e.g., OpenAI `truncation: auto`) is
//! invisible to the strategy — handled by the Provider impl internally.
//! Compaction is async and fallible because strategies may call an LLM
//! themselves (summarization) — concrete strategies live in
//! `agentex-context`, which depends on this crate for the trait and the
//! wire types it operates over.

use crate::provider::ProviderError;
use crate::types::ProviderMessage;
use std::future::Future;
use thiserror::Error;

/// Errors from context compaction.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ContextError {
    /// A strategy that calls an LLM (e.g. summarization) failed to do so.
    #[error("summarization call failed: {0}")]
    ProviderFailed(#[from] ProviderError),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Strategy for managing context window size.
///
/// Implementations: `NoCompaction` (passthrough), `SlidingWindowStrategy`
/// (drop oldest non-system messages), `ToolResultClearingStrategy`
/// (replace stale tool results with a placeholder), `SummarizationStrategy`
/// (fold old messages into an LLM-written summary), `CompositeStrategy`
/// (chain several, stopping once under budget) — see `agentex-context`.
pub trait ContextStrategy: Send + Sync {
    /// Estimate token count for a message list.
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize;

    /// Whether compaction should run given the current messages and limit.
    fn should_compact(&self, messages: &[ProviderMessage], limit: usize) -> bool;

    /// Compact the message list. Returns a shorter list.
    fn compact(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send;
}

/// A no-op context strategy that never compacts.
///
/// Useful for short conversations or when the provider handles
/// truncation natively.
pub struct NoCompaction;

impl ContextStrategy for NoCompaction {
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        // Rough estimate: 4 chars per token
        messages
            .iter()
            .flat_map(|m| &m.content)
            .map(|part| {
                use crate::types::ContentPart;
                match part {
                    ContentPart::Text { text } => text.len() / 4,
                    ContentPart::ToolUse { input, .. } => input.to_string().len() / 4,
                    ContentPart::ToolResult { content, .. } => content.len() / 4,
                    ContentPart::Image { .. } => 1000, // rough image token estimate
                }
            })
            .sum()
    }

    fn should_compact(&self, _messages: &[ProviderMessage], _limit: usize) -> bool {
        false
    }

    async fn compact(&self, messages: Vec<ProviderMessage>) -> Result<Vec<ProviderMessage>, ContextError> {
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentPart, Role};

    #[tokio::test]
    async fn no_compaction_never_compacts() {
        let strategy = NoCompaction;
        let messages = vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text {
                text: "hello".into(),
            }],
        }];

        assert!(!strategy.should_compact(&messages, 100));
        let compacted = strategy.compact(messages.clone()).await.unwrap();
        assert_eq!(compacted.len(), messages.len());
    }

    #[test]
    fn no_compaction_estimates_tokens() {
        let strategy = NoCompaction;
        let messages = vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text {
                text: "a".repeat(400),
            }],
        }];

        let estimate = strategy.token_estimate(&messages);
        assert_eq!(estimate, 100); // 400 chars / 4
    }
}
