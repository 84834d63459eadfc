//! Tool loop configuration (§4.4, §4.9 "Configuration").

use std::time::Duration;

/// How tool calls from a single LLM response are executed.
#[derive(Debug, Clone)]
pub enum ExecutionMode {
    /// Tool calls run one after another, in declared order (§4.4 step 4).
    Sequential,
    /// Tool calls from one response fan out concurrently under a bounded
    /// pool (§4.4 "Parallel mode", §5 "Parallel tool loop").
    Parallel {
        /// Deadline for a single tool call.
        per_tool_timeout: Duration,
        /// Deadline for the whole batch of concurrent calls.
        batch_timeout: Duration,
    },
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Sequential
    }
}

/// Per-invocation tool loop configuration.
#[derive(Debug, Clone)]
pub struct ToolLoopConfig {
    /// Model identifier, overriding the provider's default.
    pub model: Option<String>,
    /// System prompt prepended to the conversation.
    pub system_prompt: Option<String>,
    /// Maximum output tokens per provider call.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Loop iteration cap (§4.4 step 6). Default 20.
    pub max_iterations: u32,
    /// Sequential or parallel tool execution.
    pub mode: ExecutionMode,
    /// Token budget that triggers context compaction, when a context
    /// strategy is attached via `ToolLoop::with_context_strategy`.
    /// Ignored if no strategy is attached.
    pub context_token_limit: Option<usize>,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            max_iterations: 20,
            mode: ExecutionMode::Sequential,
            context_token_limit: None,
        }
    }
}
