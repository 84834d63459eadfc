//! Sequential execution of one LLM response's tool calls (§4.4 step 4).

use agentex_core::error::ToolLoopError;
use agentex_core::{BlackboardUpdater, ControlSignal};
use agentex_llm::ContentPart;
use agentex_tool::middleware::ToolCall;
use agentex_tool::{ToolInvocationError, ToolOutcome, ToolRegistry};

use crate::injection::{InjectionStrategy, ToolSetDelta};
use crate::result::ToolLoopRunError;

pub(crate) struct StepOutcome {
    pub tool_results: Vec<ContentPart>,
    pub delta: ToolSetDelta,
    pub replan: Option<(String, BlackboardUpdater)>,
}

/// Run `calls` one after another, in declared order.
///
/// A `ReplanRequested` signal exits immediately without appending a
/// result for the call that raised it — steps 4c-4e never run for that
/// call (§4.4 step 4b: "mark state, exit loop, return partial result").
/// Any other control signal propagates straight through.
pub(crate) async fn run_sequential(
    tools: &ToolRegistry,
    injection: &dyn InjectionStrategy,
    calls: &[ToolCall],
) -> Result<StepOutcome, ToolLoopRunError> {
    let mut tool_results = Vec::with_capacity(calls.len());
    let mut additions = Vec::new();
    let mut removals = Vec::new();

    for call in calls {
        let tool = tools
            .get(&call.name)
            .ok_or_else(|| ToolLoopRunError::from(ToolLoopError::ToolNotFound(call.name.clone())))?
            .clone();

        match tool.call(call.input.clone()).await {
            Ok(outcome) => {
                let delta = injection.evaluate(tool.as_ref(), &call.input, &outcome);
                additions.extend(delta.additions);
                removals.extend(delta.removals);
                let is_error = matches!(outcome, ToolOutcome::Error { .. });
                tool_results.push(ContentPart::ToolResult {
                    tool_use_id: call.id.as_str().to_string(),
                    content: outcome.into_history_text(),
                    is_error,
                });
            }
            Err(ToolInvocationError::Failed(message)) => {
                let outcome = ToolOutcome::Error { message };
                let delta = injection.evaluate(tool.as_ref(), &call.input, &outcome);
                additions.extend(delta.additions);
                removals.extend(delta.removals);
                tool_results.push(ContentPart::ToolResult {
                    tool_use_id: call.id.as_str().to_string(),
                    content: outcome.into_history_text(),
                    is_error: true,
                });
            }
            Err(ToolInvocationError::ControlFlow(ControlSignal::ReplanRequested { reason, updater })) => {
                return Ok(StepOutcome {
                    tool_results,
                    delta: ToolSetDelta { additions, removals },
                    replan: Some((reason, updater)),
                });
            }
            Err(ToolInvocationError::ControlFlow(signal)) => {
                return Err(ToolLoopRunError::ControlFlow(signal));
            }
        }
    }

    Ok(StepOutcome {
        tool_results,
        delta: ToolSetDelta { additions, removals },
        replan: None,
    })
}
