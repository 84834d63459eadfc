//! Parallel execution of one LLM response's tool calls (§4.4 "Parallel
//! mode", §5 "Parallel tool loop").

use std::sync::Arc;
use std::time::Duration;

use agentex_core::error::ToolLoopError;
use agentex_core::{BlackboardUpdater, ControlSignal};
use agentex_llm::ContentPart;
use agentex_tool::middleware::ToolCall;
use agentex_tool::{ToolDyn, ToolInvocationError, ToolOutcome, ToolRegistry};

use crate::injection::{InjectionStrategy, ToolSetDelta};
use crate::result::ToolLoopRunError;

pub(crate) struct StepOutcome {
    pub tool_results: Vec<ContentPart>,
    pub delta: ToolSetDelta,
    pub replan: Option<(String, BlackboardUpdater)>,
}

enum Settlement {
    Outcome(ToolOutcome),
    Control(ControlSignal),
}

/// Run every call in `calls` concurrently, then fold the results back in
/// declared order — `futures_util::future::join_all` preserves input
/// order in its output regardless of completion order, which is what
/// gives us the "appended in declared order" guarantee for free.
///
/// First control signal by declared order wins (§4.4: "First
/// `ReplanRequested` wins"); generalized here to any control signal,
/// since a `AwaitableResponse`/`ProcessKilled` racing a `ReplanRequested`
/// in the same batch needs the same tie-break. Every call's result is
/// still appended to history, including the losing ones, "for LLM
/// visibility".
pub(crate) async fn run_parallel(
    tools: &ToolRegistry,
    injection: &dyn InjectionStrategy,
    calls: &[ToolCall],
    per_tool_timeout: Duration,
    batch_timeout: Duration,
) -> Result<StepOutcome, ToolLoopRunError> {
    let mut resolved: Vec<Arc<dyn ToolDyn>> = Vec::with_capacity(calls.len());
    for call in calls {
        let tool = tools
            .get(&call.name)
            .cloned()
            .ok_or_else(|| ToolLoopRunError::from(ToolLoopError::ToolNotFound(call.name.clone())))?;
        resolved.push(tool);
    }

    let futures = calls.iter().zip(resolved.iter()).map(|(call, tool)| {
        let tool = Arc::clone(tool);
        let input = call.input.clone();
        async move {
            match tokio::time::timeout(per_tool_timeout, tool.call(input)).await {
                Ok(Ok(outcome)) => Settlement::Outcome(outcome),
                Ok(Err(ToolInvocationError::Failed(message))) => {
                    Settlement::Outcome(ToolOutcome::Error { message })
                }
                Ok(Err(ToolInvocationError::ControlFlow(signal))) => Settlement::Control(signal),
                Err(_elapsed) => Settlement::Outcome(ToolOutcome::Error {
                    message: "Tool execution timed out".to_string(),
                }),
            }
        }
    });

    let settlements =
        match tokio::time::timeout(batch_timeout, futures_util::future::join_all(futures)).await {
            Ok(settlements) => settlements,
            Err(_elapsed) => (0..calls.len())
                .map(|_| {
                    Settlement::Outcome(ToolOutcome::Error {
                        message: "Tool execution timed out".to_string(),
                    })
                })
                .collect(),
        };

    let mut tool_results = Vec::with_capacity(calls.len());
    let mut winning_replan = None;
    let mut winning_signal = None;
    let mut last_successful: Option<(usize, ToolOutcome)> = None;

    for (idx, (call, settlement)) in calls.iter().zip(settlements).enumerate() {
        match settlement {
            Settlement::Outcome(outcome) => {
                let is_error = matches!(outcome, ToolOutcome::Error { .. });
                last_successful = Some((idx, outcome.clone()));
                tool_results.push(ContentPart::ToolResult {
                    tool_use_id: call.id.as_str().to_string(),
                    content: outcome.into_history_text(),
                    is_error,
                });
            }
            Settlement::Control(signal) => {
                let text = match &signal {
                    ControlSignal::ReplanRequested { reason, .. } => {
                        format!("Error: replan requested: {reason}")
                    }
                    ControlSignal::AwaitableResponse(awaitable) => {
                        format!("Error: awaiting external input ({})", awaitable.id)
                    }
                    ControlSignal::ProcessKilled => "Error: process killed".to_string(),
                };
                tool_results.push(ContentPart::ToolResult {
                    tool_use_id: call.id.as_str().to_string(),
                    content: text,
                    is_error: true,
                });
                if winning_replan.is_none() && winning_signal.is_none() {
                    match signal {
                        ControlSignal::ReplanRequested { reason, updater } => {
                            winning_replan = Some((reason, updater));
                        }
                        other => winning_signal = Some(other),
                    }
                }
            }
        }
    }

    if let Some(signal) = winning_signal {
        return Err(ToolLoopRunError::ControlFlow(signal));
    }

    let delta = match last_successful {
        Some((idx, outcome)) => injection.evaluate(resolved[idx].as_ref(), &calls[idx].input, &outcome),
        None => ToolSetDelta::none(),
    };

    Ok(StepOutcome {
        tool_results,
        delta,
        replan: winning_replan,
    })
}
