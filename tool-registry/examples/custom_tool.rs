//! Defining a tool and running it through a middleware chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use agentex_core::{ProcessId, ToolCallId};
use agentex_tool::builtin::{OutputFormatter, TimeoutMiddleware};
use agentex_tool::middleware::{run_chain, ToolCall, ToolContext, ToolMiddleware};
use agentex_tool::{ToolDyn, ToolInvocationError, ToolOutcome, ToolRegistry};
use serde_json::json;

struct WordCount;

impl ToolDyn for WordCount {
    fn name(&self) -> &str {
        "word_count"
    }

    fn description(&self) -> &str {
        "Counts words in the given text"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({"type": "object", "required": ["text"], "properties": {"text": {"type": "string"}}})
    }

    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>> {
        Box::pin(async move {
            let text = input
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolInvocationError::failed("missing 'text'"))?;
            Ok(ToolOutcome::Text {
                content: format!("{} words", text.split_whitespace().count()),
            })
        })
    }
}

#[tokio::main]
async fn main() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WordCount));

    let chain: Vec<Arc<dyn ToolMiddleware>> = vec![
        Arc::new(TimeoutMiddleware::new(Duration::from_secs(2))),
        Arc::new(OutputFormatter::new(200)),
    ];

    let tool = registry.get("word_count").unwrap();
    let call = ToolCall {
        id: ToolCallId::new("call-1"),
        name: "word_count".into(),
        input: json!({"text": "the quick brown fox"}),
    };
    let ctx = ToolContext {
        process_id: ProcessId::new("proc-1"),
        iteration: 1,
        granted_permissions: Default::default(),
        resolves_awaitable: None,
    };

    match run_chain(tool.as_ref(), &chain, &call, &ctx).await {
        Ok(outcome) => println!("{}", outcome.into_history_text()),
        Err(err) => eprintln!("tool call failed: {err:?}"),
    }
}
