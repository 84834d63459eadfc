//! Integration coverage for chaining multiple built-in middleware together.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use agentex_core::{ProcessId, ToolCallId};
use agentex_tool::builtin::{OutputFormatter, PermissionChecker, SchemaValidator, TimeoutMiddleware};
use agentex_tool::middleware::{run_chain, ToolCall, ToolContext, ToolMiddleware};
use agentex_tool::{Permission, ToolDyn, ToolGroup, ToolGroupRegistry, ToolInvocationError, ToolOutcome, ToolRegistry};
use serde_json::json;

struct WebFetchTool;

impl ToolDyn for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }
    fn description(&self) -> &str {
        "Fetches a URL"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({"type": "object", "required": ["url"], "properties": {"url": {"type": "string"}}})
    }
    fn required_permissions(&self) -> BTreeSet<Permission> {
        BTreeSet::from([Permission::InternetAccess])
    }
    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>> {
        Box::pin(async move {
            let url = input.get("url").and_then(|v| v.as_str()).unwrap_or("");
            Ok(ToolOutcome::Text {
                content: format!("fetched {url}: {}", "body ".repeat(20)),
            })
        })
    }
}

fn ctx(perms: BTreeSet<Permission>) -> ToolContext {
    ToolContext {
        process_id: ProcessId::new("proc-1"),
        iteration: 1,
        granted_permissions: perms,
        resolves_awaitable: None,
    }
}

#[tokio::test]
async fn full_chain_validates_permissions_schema_and_truncates() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebFetchTool));

    let chain: Vec<Arc<dyn ToolMiddleware>> = vec![
        Arc::new(PermissionChecker),
        Arc::new(SchemaValidator::new(&registry)),
        Arc::new(TimeoutMiddleware::new(Duration::from_secs(1))),
        Arc::new(OutputFormatter::new(20)),
    ];

    let tool = registry.get("web_fetch").unwrap();
    let call = ToolCall {
        id: ToolCallId::new("call-1"),
        name: "web_fetch".into(),
        input: json!({"url": "https://example.com"}),
    };

    let result = run_chain(tool.as_ref(), &chain, &call, &ctx(BTreeSet::from([Permission::InternetAccess])))
        .await
        .unwrap();
    match result {
        ToolOutcome::Text { content } => assert!(content.contains("truncated")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn full_chain_rejects_missing_permission_before_schema_check() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebFetchTool));

    let chain: Vec<Arc<dyn ToolMiddleware>> =
        vec![Arc::new(PermissionChecker), Arc::new(SchemaValidator::new(&registry))];

    let tool = registry.get("web_fetch").unwrap();
    let call = ToolCall {
        id: ToolCallId::new("call-1"),
        name: "web_fetch".into(),
        input: json!({}),
    };

    let err = run_chain(tool.as_ref(), &chain, &call, &ctx(BTreeSet::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolInvocationError::Failed(msg) if msg.contains("permission")));
}

#[test]
fn tool_group_resolves_members_by_role() {
    let mut groups = ToolGroupRegistry::new();
    groups.register(
        ToolGroup {
            role: "web".into(),
            name: "default-web-tools".into(),
            provider: "internal".into(),
            permissions: BTreeSet::from([Permission::InternetAccess]),
            version: "0.1.0".into(),
        },
        vec![Arc::new(WebFetchTool)],
    );

    let (group, tools) = groups.resolve_required("web").unwrap();
    assert_eq!(group.provider, "internal");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name(), "web_fetch");

    let missing = groups.resolve_required("code-exec");
    assert!(missing.is_err());
}
