//! Context compaction strategies implementing [`agentex_llm::ContextStrategy`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agentex_llm::{ContentPart, ContextError, ContextStrategy, Provider, ProviderMessage, Role};

use crate::counter::TokenCounter;

// ---- Dyn-compatible wrapper for CompositeStrategy --------------------------

/// Pinned, boxed, `Send` future returning compacted messages.
type CompactFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send + 'a>>;

/// A dyn-compatible strategy object. Used internally by [`CompositeStrategy`].
///
/// `ContextStrategy::compact` returns `impl Future` (RPITIT), so the trait
/// itself isn't dyn-compatible. This is the vtable-friendly equivalent that
/// boxes the future — only `CompositeStrategy` needs heterogeneous storage,
/// everywhere else the RPITIT form is kept.
trait ErasedStrategy: Send + Sync {
    fn erased_compact<'a>(&'a self, messages: Vec<ProviderMessage>) -> CompactFuture<'a>;
    fn erased_token_estimate(&self, messages: &[ProviderMessage]) -> usize;
    fn erased_should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool;
}

impl<S: ContextStrategy> ErasedStrategy for S {
    fn erased_compact<'a>(&'a self, messages: Vec<ProviderMessage>) -> CompactFuture<'a> {
        Box::pin(self.compact(messages))
    }

    fn erased_token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.token_estimate(messages)
    }

    fn erased_should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool {
        self.should_compact(messages, token_count)
    }
}

/// A type-erased wrapper around a [`ContextStrategy`] for use in [`CompositeStrategy`].
///
/// # Example
///
/// ```
/// use agentex_context::{SlidingWindowStrategy, BoxedStrategy};
///
/// let boxed = BoxedStrategy::new(SlidingWindowStrategy::new(10, 100_000));
/// ```
pub struct BoxedStrategy(Arc<dyn ErasedStrategy>);

impl BoxedStrategy {
    /// Wraps any [`ContextStrategy`] into a type-erased `BoxedStrategy`.
    #[must_use]
    pub fn new<S: ContextStrategy + 'static>(strategy: S) -> Self {
        BoxedStrategy(Arc::new(strategy))
    }
}

impl ContextStrategy for BoxedStrategy {
    fn should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool {
        self.0.erased_should_compact(messages, token_count)
    }

    fn compact(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send {
        let inner = Arc::clone(&self.0);
        async move { inner.erased_compact(messages).await }
    }

    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.0.erased_token_estimate(messages)
    }
}

// ---- SlidingWindowStrategy --------------------------------------------------

/// Keeps system messages plus the last `window_size` non-system messages.
///
/// Triggers compaction when the estimated token count exceeds `max_tokens`.
pub struct SlidingWindowStrategy {
    window_size: usize,
    counter: TokenCounter,
    max_tokens: usize,
}

impl SlidingWindowStrategy {
    /// Creates a new `SlidingWindowStrategy`.
    #[must_use]
    pub fn new(window_size: usize, max_tokens: usize) -> Self {
        Self {
            window_size,
            counter: TokenCounter::new(),
            max_tokens,
        }
    }

    /// Creates a new `SlidingWindowStrategy` with a custom [`TokenCounter`].
    #[must_use]
    pub fn with_counter(window_size: usize, max_tokens: usize, counter: TokenCounter) -> Self {
        Self {
            window_size,
            counter,
            max_tokens,
        }
    }
}

impl ContextStrategy for SlidingWindowStrategy {
    fn should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool {
        let _ = messages;
        token_count > self.max_tokens
    }

    fn compact(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send {
        let window_size = self.window_size;
        async move {
            let before = messages.len();
            let (system_msgs, non_system): (Vec<_>, Vec<_>) =
                messages.into_iter().partition(|m| m.role == Role::System);

            let recent: Vec<ProviderMessage> = non_system
                .into_iter()
                .rev()
                .take(window_size)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();

            let mut result = system_msgs;
            result.extend(recent);
            tracing::debug!(before, after = result.len(), "sliding window compaction");
            Ok(result)
        }
    }

    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.counter.estimate_messages(messages)
    }
}

// ---- ToolResultClearingStrategy ---------------------------------------------

/// Replaces old tool result content with a placeholder to reduce token usage.
///
/// Keeps the most recent `keep_recent_n` tool results intact and replaces
/// older ones with `[tool result cleared]` while preserving `tool_use_id`
/// so the conversation still makes semantic sense.
pub struct ToolResultClearingStrategy {
    keep_recent_n: usize,
    counter: TokenCounter,
    max_tokens: usize,
}

impl ToolResultClearingStrategy {
    /// Creates a new `ToolResultClearingStrategy`.
    #[must_use]
    pub fn new(keep_recent_n: usize, max_tokens: usize) -> Self {
        Self {
            keep_recent_n,
            counter: TokenCounter::new(),
            max_tokens,
        }
    }

    /// Creates a new `ToolResultClearingStrategy` with a custom [`TokenCounter`].
    #[must_use]
    pub fn with_counter(keep_recent_n: usize, max_tokens: usize, counter: TokenCounter) -> Self {
        Self {
            keep_recent_n,
            counter,
            max_tokens,
        }
    }
}

impl ContextStrategy for ToolResultClearingStrategy {
    fn should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool {
        let _ = messages;
        token_count > self.max_tokens
    }

    fn compact(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send {
        let keep_recent_n = self.keep_recent_n;
        async move {
            let mut tool_result_positions: Vec<(usize, usize)> = Vec::new();
            for (msg_idx, msg) in messages.iter().enumerate() {
                for (part_idx, part) in msg.content.iter().enumerate() {
                    if matches!(part, ContentPart::ToolResult { .. }) {
                        tool_result_positions.push((msg_idx, part_idx));
                    }
                }
            }

            let total = tool_result_positions.len();
            let to_clear_count = total.saturating_sub(keep_recent_n);

            if to_clear_count == 0 {
                return Ok(messages);
            }

            let to_clear = tool_result_positions[..to_clear_count].to_vec();
            let mut messages = messages;
            for (msg_idx, part_idx) in to_clear {
                let part = &mut messages[msg_idx].content[part_idx];
                if let ContentPart::ToolResult { content, is_error, .. } = part {
                    *content = "[tool result cleared]".to_string();
                    *is_error = false;
                }
            }

            tracing::debug!(cleared = to_clear_count, total, "cleared stale tool result content");
            Ok(messages)
        }
    }

    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.counter.estimate_messages(messages)
    }
}

// ---- SummarizationStrategy --------------------------------------------------

/// Summarizes old messages using an LLM provider, preserving recent messages verbatim.
///
/// When compaction is triggered, messages older than `preserve_recent` are sent
/// to the provider with a summarization prompt. The response replaces the old
/// messages with a single `User` message containing the summary, followed by
/// the preserved recent messages.
pub struct SummarizationStrategy<P: Provider> {
    provider: P,
    preserve_recent: usize,
    counter: TokenCounter,
    max_tokens: usize,
}

impl<P: Provider> SummarizationStrategy<P> {
    /// Creates a new `SummarizationStrategy`.
    #[must_use]
    pub fn new(provider: P, preserve_recent: usize, max_tokens: usize) -> Self {
        Self {
            provider,
            preserve_recent,
            counter: TokenCounter::new(),
            max_tokens,
        }
    }

    /// Creates a new `SummarizationStrategy` with a custom [`TokenCounter`].
    #[must_use]
    pub fn with_counter(
        provider: P,
        preserve_recent: usize,
        max_tokens: usize,
        counter: TokenCounter,
    ) -> Self {
        Self {
            provider,
            preserve_recent,
            counter,
            max_tokens,
        }
    }
}

impl<P: Provider> ContextStrategy for SummarizationStrategy<P> {
    fn should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool {
        let _ = messages;
        token_count > self.max_tokens
    }

    fn compact(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send {
        use agentex_llm::ProviderRequest;

        let preserve_recent = self.preserve_recent;

        let (system_msgs, non_system): (Vec<ProviderMessage>, Vec<ProviderMessage>) =
            messages.into_iter().partition(|m| m.role == Role::System);

        let split_at = non_system.len().saturating_sub(preserve_recent);
        let old_messages = non_system[..split_at].to_vec();
        let recent_messages = non_system[split_at..].to_vec();

        let summarize_request = ProviderRequest {
            model: None,
            messages: old_messages,
            tools: vec![],
            max_tokens: Some(1024),
            temperature: Some(0.0),
            system: Some(
                "Summarize the conversation above concisely. Focus on key information, \
                 decisions made, and results from tool calls. Write in third person."
                    .to_string(),
            ),
            extra: serde_json::Value::Null,
        };

        async move {
            let response = self.provider.complete(summarize_request).await?;

            let summary_text = response
                .content
                .into_iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n");

            let summary_message = ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text {
                    text: format!("[Summary of earlier conversation]\n{summary_text}"),
                }],
            };

            tracing::debug!(
                summarized = split_at,
                kept = recent_messages.len(),
                "summarized old context"
            );
            let mut result = system_msgs;
            result.push(summary_message);
            result.extend(recent_messages);
            Ok(result)
        }
    }

    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.counter.estimate_messages(messages)
    }
}

// ---- CompositeStrategy ------------------------------------------------------

/// Chains multiple strategies, applying each in order until token budget is met.
///
/// Each strategy is tried in sequence. After each strategy's `compact` runs,
/// the resulting token count is re-estimated; iteration stops once it falls
/// below `max_tokens`.
///
/// # Example
///
/// ```
/// use agentex_context::{BoxedStrategy, CompositeStrategy, SlidingWindowStrategy, ToolResultClearingStrategy};
///
/// let strategy = CompositeStrategy::new(vec![
///     BoxedStrategy::new(ToolResultClearingStrategy::new(2, 100_000)),
///     BoxedStrategy::new(SlidingWindowStrategy::new(10, 100_000)),
/// ], 100_000);
/// ```
pub struct CompositeStrategy {
    strategies: Vec<BoxedStrategy>,
    counter: TokenCounter,
    max_tokens: usize,
}

impl CompositeStrategy {
    /// Creates a new `CompositeStrategy`.
    #[must_use]
    pub fn new(strategies: Vec<BoxedStrategy>, max_tokens: usize) -> Self {
        Self {
            strategies,
            counter: TokenCounter::new(),
            max_tokens,
        }
    }
}

impl ContextStrategy for CompositeStrategy {
    fn should_compact(&self, messages: &[ProviderMessage], token_count: usize) -> bool {
        let _ = messages;
        token_count > self.max_tokens
    }

    fn compact(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> impl Future<Output = Result<Vec<ProviderMessage>, ContextError>> + Send {
        let inner_refs: Vec<Arc<dyn ErasedStrategy>> =
            self.strategies.iter().map(|b| Arc::clone(&b.0)).collect();
        let max_tokens = self.max_tokens;
        let counter = TokenCounter::new();

        async move {
            let before = counter.estimate_messages(&messages);
            let mut current = messages;
            let mut strategies_run = 0;
            for strategy in &inner_refs {
                let token_count = counter.estimate_messages(&current);
                if token_count <= max_tokens {
                    break;
                }
                current = strategy.erased_compact(current).await?;
                strategies_run += 1;
            }
            tracing::debug!(
                before,
                after = counter.estimate_messages(&current),
                strategies_run,
                "composite context compaction"
            );
            Ok(current)
        }
    }

    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.counter.estimate_messages(messages)
    }
}
