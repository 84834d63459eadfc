//! Token estimation shared by every strategy in this crate.
//!
//! There's no tokenizer dependency here — this is the same 4-chars-per-token
//! heuristic `agentex_llm::NoCompaction` uses, factored out so strategies
//! share one estimate instead of drifting apart.

use agentex_llm::{ContentPart, ProviderMessage};

/// Estimates token counts for provider messages.
///
/// `chars_per_token` defaults to 4, matching typical English text. Callers
/// that know their model's tokenizer runs denser or sparser can override it.
#[derive(Debug, Clone, Copy)]
pub struct TokenCounter {
    chars_per_token: usize,
}

impl TokenCounter {
    /// Creates a counter with the default 4-chars-per-token ratio.
    #[must_use]
    pub fn new() -> Self {
        Self { chars_per_token: 4 }
    }

    /// Creates a counter with a custom chars-per-token ratio.
    #[must_use]
    pub fn with_ratio(chars_per_token: usize) -> Self {
        assert!(chars_per_token > 0, "chars_per_token must be positive");
        Self { chars_per_token }
    }

    /// Estimates the token count of a single message.
    #[must_use]
    pub fn estimate_message(&self, message: &ProviderMessage) -> usize {
        message
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text.len() / self.chars_per_token,
                ContentPart::ToolUse { input, .. } => input.to_string().len() / self.chars_per_token,
                ContentPart::ToolResult { content, .. } => content.len() / self.chars_per_token,
                ContentPart::Image { .. } => 1000,
            })
            .sum::<usize>()
            + 4 // per-message role/framing overhead
    }

    /// Estimates the token count of a full message list.
    #[must_use]
    pub fn estimate_messages(&self, messages: &[ProviderMessage]) -> usize {
        messages.iter().map(|m| self.estimate_message(m)).sum()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}
