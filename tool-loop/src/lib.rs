#![deny(missing_docs)]
//! The tool loop (C7, §4.4) — drives one LLM reasoning turn to
//! completion: call the model, run the tool calls it emits, fold the
//! results back into the conversation, and repeat until the model stops
//! calling tools or a cap is hit.
//!
//! A tool loop is not itself an `ActionBody` — it's a building block an
//! action reaches for when its work is "have an LLM reason over a set of
//! tools". An action's `execute` constructs a [`ToolLoop`], runs it, and
//! turns the result into an `ActionResult` (a `ReplanRequested` outcome
//! becomes a replan via `ProcessContext::replan`; an `AwaitableResponse`
//! or `ProcessKilled` signal surfacing from [`ToolLoopRunError::ControlFlow`]
//! does the same via `ProcessContext::await_response`).

pub mod config;
pub mod injection;
pub mod parser;
pub mod result;

mod parallel;
mod sequential;

pub use config::{ExecutionMode, ToolLoopConfig};
pub use injection::{InjectionStrategy, MatryoshkaInjectionStrategy, NoopInjectionStrategy, ToolSetDelta};
pub use parser::{JsonOutputParser, OutputParser, TextOutputParser};
pub use result::{ToolLoopOutcome, ToolLoopRunError};

use std::sync::Arc;

use agentex_context::BoxedStrategy;
use agentex_core::Usage;
use agentex_llm::{
    ContentPart, ContextError, ContextStrategy, Provider, ProviderError, ProviderMessage,
    ProviderRequest, Role, StopReason, ToolSchema,
};
use agentex_tool::middleware::ToolCall;
use agentex_tool::{ToolDyn, ToolRegistry};

/// Drives a single tool loop invocation (§4.4).
///
/// Generic over `P: Provider` rather than boxed, matching the rest of
/// agentex's LLM-facing code (`Provider` uses RPITIT and isn't
/// object-safe). Context compaction goes through [`BoxedStrategy`]
/// instead, since a tool loop may want to swap strategies without
/// becoming generic over a second type parameter.
pub struct ToolLoop<P: Provider> {
    provider: P,
    initial_tools: Vec<Arc<dyn ToolDyn>>,
    context_strategy: Option<BoxedStrategy>,
    injection: Box<dyn InjectionStrategy>,
    config: ToolLoopConfig,
}

impl<P: Provider> ToolLoop<P> {
    /// Construct a tool loop with the given provider, starting tool set,
    /// and configuration. Defaults to [`NoopInjectionStrategy`] and no
    /// context compaction.
    pub fn new(provider: P, initial_tools: Vec<Arc<dyn ToolDyn>>, config: ToolLoopConfig) -> Self {
        Self {
            provider,
            initial_tools,
            context_strategy: None,
            injection: Box::new(NoopInjectionStrategy),
            config,
        }
    }

    /// Use a custom injection strategy (e.g. [`MatryoshkaInjectionStrategy`]
    /// for progressive disclosure).
    #[must_use]
    pub fn with_injection_strategy(mut self, strategy: impl InjectionStrategy + 'static) -> Self {
        self.injection = Box::new(strategy);
        self
    }

    /// Compact the conversation with `strategy` once it exceeds
    /// `token_limit` tokens, checked at the top of every iteration.
    #[must_use]
    pub fn with_context_strategy(mut self, strategy: BoxedStrategy, token_limit: usize) -> Self {
        self.context_strategy = Some(strategy);
        self.config.context_token_limit = Some(token_limit);
        self
    }

    /// Run the loop to completion (§4.4 steps 1-6).
    ///
    /// `initial_messages` seeds the conversation (typically a system
    /// framing plus the triggering user turn). Returns once the model
    /// stops calling tools (`Completed`) or a tool requests a replan
    /// (`ReplanRequested`); any other control signal or ordinary failure
    /// comes back as `Err`.
    pub async fn run<O: OutputParser>(
        &self,
        initial_messages: Vec<ProviderMessage>,
        parser: &O,
    ) -> Result<ToolLoopOutcome<O::Output>, ToolLoopRunError> {
        let mut available = ToolRegistry::new();
        for tool in &self.initial_tools {
            available.register(Arc::clone(tool));
        }

        let mut messages = initial_messages;
        let mut usage = Usage::default();
        let mut iterations: u32 = 0;

        loop {
            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(ToolLoopRunError::from(
                    agentex_core::error::ToolLoopError::MaxIterationsExceeded(
                        self.config.max_iterations as usize,
                    ),
                ));
            }

            if let (Some(strategy), Some(limit)) =
                (&self.context_strategy, self.config.context_token_limit)
            {
                if strategy.should_compact(&messages, limit) {
                    let before = messages.len();
                    messages = strategy.compact(messages).await.map_err(context_error_to_run_error)?;
                    tracing::debug!(before, after = messages.len(), "compacted tool loop context");
                }
            }

            let schemas: Vec<ToolSchema> = available
                .definitions()
                .into_iter()
                .map(|d| ToolSchema {
                    name: d.name,
                    description: d.description,
                    input_schema: d.input_schema,
                })
                .collect();

            let request = ProviderRequest {
                model: self.config.model.clone(),
                messages: messages.clone(),
                tools: schemas,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                system: self.config.system_prompt.clone(),
                extra: serde_json::Value::Null,
            };

            tracing::trace!(iteration = iterations, tool_count = available.len(), "calling provider");
            let response = self.provider.complete(request).await?;

            usage.prompt_tokens += response.usage.input_tokens;
            usage.completion_tokens += response.usage.output_tokens;
            if let Some(cost) = response.cost {
                usage.cost += cost;
            }

            match response.stop_reason {
                StopReason::MaxTokens => {
                    return Err(ToolLoopRunError::from(ProviderError::InvalidResponse(
                        "provider stopped at max_tokens before finishing its turn".to_string(),
                    )));
                }
                StopReason::ContentFilter => {
                    return Err(ToolLoopRunError::from(ProviderError::InvalidResponse(
                        "provider response was content-filtered".to_string(),
                    )));
                }
                StopReason::EndTurn | StopReason::ToolUse => {}
            }

            messages.push(ProviderMessage {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            let calls: Vec<ToolCall> = response
                .content
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ToolUse { id, name, input } => Some(ToolCall {
                        id: agentex_core::ToolCallId::new(id.clone()),
                        name: name.clone(),
                        input: input.clone(),
                    }),
                    _ => None,
                })
                .collect();

            if calls.is_empty() {
                let text: String = response
                    .content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("");
                let output = parser.parse(&text)?;
                return Ok(ToolLoopOutcome::Completed {
                    output,
                    history: messages,
                    usage,
                    iterations,
                });
            }

            tracing::trace!(iteration = iterations, call_count = calls.len(), "executing tool calls");

            let step = match &self.config.mode {
                ExecutionMode::Sequential => {
                    sequential::run_sequential(&available, self.injection.as_ref(), &calls).await?
                }
                ExecutionMode::Parallel { per_tool_timeout, batch_timeout } => {
                    parallel::run_parallel(
                        &available,
                        self.injection.as_ref(),
                        &calls,
                        *per_tool_timeout,
                        *batch_timeout,
                    )
                    .await?
                }
            };

            if !step.tool_results.is_empty() {
                messages.push(ProviderMessage {
                    role: Role::User,
                    content: step.tool_results,
                });
            }

            for name in step.delta.removals {
                available.remove(&name);
            }
            for tool in step.delta.additions {
                available.register(tool);
            }

            if let Some((reason, updater)) = step.replan {
                tracing::debug!(reason = %reason, "tool loop exiting for replan");
                return Ok(ToolLoopOutcome::ReplanRequested {
                    reason,
                    updater,
                    history: messages,
                    usage,
                });
            }
        }
    }
}

fn context_error_to_run_error(e: ContextError) -> ToolLoopRunError {
    match e {
        ContextError::ProviderFailed(e) => ToolLoopRunError::Provider(e),
        ContextError::Other(e) => ToolLoopRunError::ToolLoop(agentex_core::error::ToolLoopError::Other(e)),
    }
}
