//! Injection strategies — dynamic additions/removals to `available_tools`
//! as a side effect of a tool call (§4.4 step 4d, "Progressive disclosure").

use agentex_tool::{ToolDyn, ToolOutcome};
use serde_json::Value;
use std::sync::Arc;

/// Tools to add/remove from `available_tools` after a tool call. The
/// caller is responsible for deduplicating additions by name.
#[derive(Default)]
pub struct ToolSetDelta {
    /// Tools to add.
    pub additions: Vec<Arc<dyn ToolDyn>>,
    /// Names of tools to remove.
    pub removals: Vec<String>,
}

impl ToolSetDelta {
    /// No change to the tool set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether this delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Decides how a completed tool call changes the set of tools available
/// to the next LLM call.
pub trait InjectionStrategy: Send + Sync {
    /// Evaluate the delta for one completed tool call.
    fn evaluate(&self, tool: &dyn ToolDyn, input: &Value, outcome: &ToolOutcome) -> ToolSetDelta;
}

/// No tool call ever changes the available set.
pub struct NoopInjectionStrategy;

impl InjectionStrategy for NoopInjectionStrategy {
    fn evaluate(&self, _tool: &dyn ToolDyn, _input: &Value, _outcome: &ToolOutcome) -> ToolSetDelta {
        ToolSetDelta::none()
    }
}

/// Progressive disclosure (Matryoshka, §4.4): on invoke, removes the outer
/// tool if it asks to be (`remove_on_invoke`), and adds its `inner_tools`.
/// Inner tools can be narrowed by the invocation's input.
pub struct MatryoshkaInjectionStrategy {
    filter: Option<Box<dyn Fn(&Value, &[Arc<dyn ToolDyn>]) -> Vec<Arc<dyn ToolDyn>> + Send + Sync>>,
}

impl MatryoshkaInjectionStrategy {
    /// A strategy that always exposes every inner tool the invoked tool
    /// declares.
    pub fn new() -> Self {
        Self { filter: None }
    }

    /// A strategy that narrows the inner tools by the invocation's input
    /// (e.g. a tool that only reveals the inner tools relevant to a
    /// requested category).
    pub fn with_filter(
        filter: impl Fn(&Value, &[Arc<dyn ToolDyn>]) -> Vec<Arc<dyn ToolDyn>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            filter: Some(Box::new(filter)),
        }
    }
}

impl Default for MatryoshkaInjectionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectionStrategy for MatryoshkaInjectionStrategy {
    fn evaluate(&self, tool: &dyn ToolDyn, input: &Value, _outcome: &ToolOutcome) -> ToolSetDelta {
        let inner = tool.inner_tools();
        let additions = match &self.filter {
            Some(f) => f(input, &inner),
            None => inner,
        };
        let removals = if tool.remove_on_invoke() {
            vec![tool.name().to_string()]
        } else {
            Vec::new()
        };
        ToolSetDelta { additions, removals }
    }
}
