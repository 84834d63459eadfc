//! Outcomes and errors of a tool loop run (§4.4, §7).

use agentex_core::{BlackboardUpdater, ControlSignal, Usage};
use agentex_llm::{ProviderError, ProviderMessage};

/// What a tool loop invocation settles to.
#[derive(Debug)]
pub enum ToolLoopOutcome<T> {
    /// The model stopped calling tools; `output` is the parsed text
    /// (§4.4 step 3).
    Completed {
        /// Parsed final output.
        output: T,
        /// Full message history accumulated during the run.
        history: Vec<ProviderMessage>,
        /// Usage accumulated during the run.
        usage: Usage,
        /// Number of LLM round-trips taken.
        iterations: u32,
    },
    /// A tool requested a replan (§4.4 step 4b). The loop exits
    /// immediately with whatever history/usage accumulated so far; the
    /// calling action body is expected to surface this through
    /// [`agentex_core::ProcessContext::replan`].
    ReplanRequested {
        /// Why the replan was requested.
        reason: String,
        /// Blackboard mutation to apply before replanning.
        updater: BlackboardUpdater,
        /// Partial history accumulated before the replan.
        history: Vec<ProviderMessage>,
        /// Partial usage accumulated before the replan.
        usage: Usage,
    },
}

/// Mirrors [`agentex_core::ActionError`]'s split between ordinary
/// failures and control signals that must bypass blanket error handling:
/// a tool loop always runs inside an `ActionBody`, so its own errors
/// ultimately need to land in the same two buckets.
#[derive(Debug)]
pub enum ToolLoopRunError {
    /// An ordinary tool loop failure (§7 `ToolNotFound`,
    /// `MaxIterationsExceeded`, `ValidationFailure`, ...).
    ToolLoop(agentex_core::error::ToolLoopError),
    /// The provider call itself failed.
    Provider(ProviderError),
    /// A control signal other than `ReplanRequested` — `AwaitableResponse`
    /// or `ProcessKilled` — propagated untouched to the executor.
    ControlFlow(ControlSignal),
}

impl From<agentex_core::error::ToolLoopError> for ToolLoopRunError {
    fn from(e: agentex_core::error::ToolLoopError) -> Self {
        ToolLoopRunError::ToolLoop(e)
    }
}

impl From<ProviderError> for ToolLoopRunError {
    fn from(e: ProviderError) -> Self {
        ToolLoopRunError::Provider(e)
    }
}
