//! Built-in middleware implementations.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::middleware::{Next, ToolCall, ToolContext, ToolMiddleware};
use crate::{ToolInvocationError, ToolOutcome, ToolRegistry};

/// Middleware that checks a tool's [`crate::Permission`] requirements
/// against what the call's [`ToolContext`] was granted.
///
/// If the tool requires a permission the context doesn't have, the call
/// is rejected without reaching the tool.
pub struct PermissionChecker;

impl ToolMiddleware for PermissionChecker {
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        Box::pin(async move {
            let required = next.tool().required_permissions();
            let missing: Vec<_> = required
                .difference(&ctx.granted_permissions)
                .map(|p| format!("{p:?}"))
                .collect();
            if !missing.is_empty() {
                return Err(ToolInvocationError::failed(format!(
                    "tool '{}' requires permissions not granted to this call: {}",
                    call.name,
                    missing.join(", ")
                )));
            }
            next.run(call, ctx).await
        })
    }
}

/// Middleware that truncates text tool output to a maximum character length.
///
/// Long tool outputs can consume excessive tokens in the context window.
pub struct OutputFormatter {
    max_chars: usize,
}

impl OutputFormatter {
    /// Create a new output formatter with the given character limit.
    #[must_use]
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    fn truncate(&self, text: String) -> String {
        if text.len() <= self.max_chars {
            return text;
        }
        let mut boundary = self.max_chars;
        while boundary > 0 && !text.is_char_boundary(boundary) {
            boundary -= 1;
        }
        format!("{}... [truncated, {} chars total]", &text[..boundary], text.len())
    }
}

impl ToolMiddleware for OutputFormatter {
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        Box::pin(async move {
            let output = next.run(call, ctx).await?;
            Ok(match output {
                ToolOutcome::Text { content } => ToolOutcome::Text {
                    content: self.truncate(content),
                },
                ToolOutcome::WithArtifact { content, artifact } => ToolOutcome::WithArtifact {
                    content: self.truncate(content),
                    artifact,
                },
                ToolOutcome::Error { message } => ToolOutcome::Error {
                    message: self.truncate(message),
                },
            })
        })
    }
}

/// Middleware that validates tool call input against the tool's JSON Schema.
///
/// Performs lightweight structural validation: checks that the input is an
/// object, required fields are present, and property types match the schema.
/// This catches obvious input errors before the tool executes, without
/// depending on a full JSON Schema validation library.
pub struct SchemaValidator {
    /// Map of tool name to its input_schema JSON value.
    schemas: HashMap<String, serde_json::Value>,
}

impl SchemaValidator {
    /// Create a new schema validator from the current tool registry.
    ///
    /// Snapshots all tool definitions at construction time. Tools registered
    /// after this call will not be validated.
    #[must_use]
    pub fn new(registry: &ToolRegistry) -> Self {
        let schemas = registry
            .definitions()
            .into_iter()
            .map(|def| (def.name, def.input_schema))
            .collect();
        Self { schemas }
    }
}

impl ToolMiddleware for SchemaValidator {
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(schema) = self.schemas.get(&call.name) {
                validate_input(&call.input, schema).map_err(ToolInvocationError::Failed)?;
            }
            next.run(call, ctx).await
        })
    }
}

/// Validate a JSON input value against a JSON Schema object.
///
/// Performs lightweight structural checks:
/// - Input must be an object (if schema says `"type": "object"`)
/// - All `"required"` fields must be present
/// - Property types must match the schema's `"type"` declarations
fn validate_input(input: &serde_json::Value, schema: &serde_json::Value) -> Result<(), String> {
    let schema_obj = match schema.as_object() {
        Some(obj) => obj,
        None => return Ok(()),
    };

    if let Some(serde_json::Value::String(ty)) = schema_obj.get("type")
        && ty == "object"
        && !input.is_object()
    {
        return Err("expected object input".to_string());
    }

    let input_obj = match input.as_object() {
        Some(obj) => obj,
        None => return Ok(()),
    };

    if let Some(serde_json::Value::Array(required)) = schema_obj.get("required") {
        for field in required {
            if let Some(field_name) = field.as_str()
                && !input_obj.contains_key(field_name)
            {
                return Err(format!("missing required field: {field_name}"));
            }
        }
    }

    if let Some(serde_json::Value::Object(properties)) = schema_obj.get("properties") {
        for (field_name, prop_schema) in properties {
            if let Some(value) = input_obj.get(field_name)
                && let Some(serde_json::Value::String(expected_type)) = prop_schema.get("type")
                && !json_type_matches(value, expected_type)
            {
                return Err(format!(
                    "field '{field_name}' expected type '{expected_type}', got {}",
                    json_type_name(value)
                ));
            }
        }
    }

    Ok(())
}

/// Check if a JSON value matches the expected JSON Schema type string.
fn json_type_matches(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Return the JSON type name for a value (for error messages).
fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Middleware that enforces a timeout on tool execution (§4.4 "parallel
/// mode": per-tool and batch timeouts).
///
/// Wraps the downstream call in [`tokio::time::timeout`]. A timeout
/// becomes `ToolOutcome::Error`, not a control signal — the model sees
/// it and can retry or move on.
///
/// Per-tool overrides allow different timeouts for tools with known
/// different latency profiles (e.g., web scraping vs. simple computation).
pub struct TimeoutMiddleware {
    default_timeout: Duration,
    per_tool: HashMap<String, Duration>,
}

impl TimeoutMiddleware {
    /// Create a new timeout middleware with the given default timeout.
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            per_tool: HashMap::new(),
        }
    }

    /// Set a per-tool timeout override.
    #[must_use]
    pub fn with_tool_timeout(mut self, tool_name: impl Into<String>, timeout: Duration) -> Self {
        self.per_tool.insert(tool_name.into(), timeout);
        self
    }
}

impl ToolMiddleware for TimeoutMiddleware {
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        Box::pin(async move {
            let timeout = self
                .per_tool
                .get(&call.name)
                .copied()
                .unwrap_or(self.default_timeout);
            match tokio::time::timeout(timeout, next.run(call, ctx)).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    tracing::warn!(tool = %call.name, timeout_secs = timeout.as_secs_f64(), "tool call timed out");
                    Err(ToolInvocationError::failed(format!(
                        "tool '{}' timed out after {:.1}s",
                        call.name,
                        timeout.as_secs_f64()
                    )))
                }
            }
        })
    }
}

/// Middleware that validates structured output from a tool against a JSON Schema.
///
/// When attached to a "result" tool (e.g. a Supervisor planner's goal
/// tool), validates the model's JSON input against the expected schema
/// before invoking it, returning a failure the model can read and
/// self-correct from.
pub struct StructuredOutputValidator {
    schema: serde_json::Value,
    max_retries: usize,
}

impl StructuredOutputValidator {
    /// Create a new structured output validator.
    ///
    /// The `schema` should be a JSON Schema object describing the expected
    /// output shape. `max_retries` limits how many times the model can
    /// retry on validation failure (0 means fail immediately on first error).
    #[must_use]
    pub fn new(schema: serde_json::Value, max_retries: usize) -> Self {
        Self { schema, max_retries }
    }

    /// Create a validator whose schema is derived from `T` via `schemars`
    /// instead of hand-written JSON.
    #[must_use]
    pub fn for_type<T: schemars::JsonSchema>(max_retries: usize) -> Self {
        Self::new(crate::json_schema_for::<T>(), max_retries)
    }
}

impl ToolMiddleware for StructuredOutputValidator {
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = validate_input(&call.input, &self.schema) {
                return Err(ToolInvocationError::failed(format!(
                    "output validation failed: {e}. Please fix the output to match the schema."
                )));
            }
            next.run(call, ctx).await
        })
    }
}

/// Tracks retry count for structured output validation.
///
/// Wraps [`StructuredOutputValidator`] and enforces a maximum number of
/// retries. After `max_retries` validation failures, the error message no
/// longer invites a retry.
pub struct RetryLimitedValidator {
    inner: StructuredOutputValidator,
    attempts: std::sync::atomic::AtomicUsize,
}

impl RetryLimitedValidator {
    /// Create a new retry-limited validator wrapping a [`StructuredOutputValidator`].
    #[must_use]
    pub fn new(validator: StructuredOutputValidator) -> Self {
        Self {
            inner: validator,
            attempts: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl ToolMiddleware for RetryLimitedValidator {
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = validate_input(&call.input, &self.inner.schema) {
                let attempt = self
                    .attempts
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                if attempt >= self.inner.max_retries {
                    return Err(ToolInvocationError::failed(format!(
                        "output validation failed after {} retries: {e}",
                        self.inner.max_retries
                    )));
                }
                return Err(ToolInvocationError::failed(format!(
                    "output validation failed (attempt {}/{}): {e}. Please fix the output to match the schema.",
                    attempt + 1,
                    self.inner.max_retries
                )));
            }
            self.attempts.store(0, std::sync::atomic::Ordering::Relaxed);
            next.run(call, ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::run_chain;
    use crate::{Permission, ToolDyn};
    use agentex_core::{ProcessId, ToolCallId};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    struct NeedsHostTool;
    impl ToolDyn for NeedsHostTool {
        fn name(&self) -> &str {
            "shell"
        }
        fn description(&self) -> &str {
            "runs a shell command"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object", "required": ["cmd"], "properties": {"cmd": {"type": "string"}}})
        }
        fn required_permissions(&self) -> BTreeSet<Permission> {
            BTreeSet::from([Permission::HostAccess])
        }
        fn call(
            &self,
            _input: serde_json::Value,
        ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>>
        {
            Box::pin(async { Ok(ToolOutcome::Text { content: "ran".into() }) })
        }
    }

    fn ctx(perms: BTreeSet<Permission>) -> ToolContext {
        ToolContext {
            process_id: ProcessId::new("p1"),
            iteration: 1,
            granted_permissions: perms,
            resolves_awaitable: None,
        }
    }

    #[tokio::test]
    async fn permission_checker_rejects_missing_permission() {
        let tool = NeedsHostTool;
        let call = ToolCall {
            id: ToolCallId::new("c1"),
            name: "shell".into(),
            input: json!({"cmd": "ls"}),
        };
        let chain: Vec<Arc<dyn ToolMiddleware>> = vec![Arc::new(PermissionChecker)];
        let err = run_chain(&tool, &chain, &call, &ctx(BTreeSet::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolInvocationError::Failed(_)));
    }

    #[tokio::test]
    async fn permission_checker_allows_granted_permission() {
        let tool = NeedsHostTool;
        let call = ToolCall {
            id: ToolCallId::new("c1"),
            name: "shell".into(),
            input: json!({"cmd": "ls"}),
        };
        let chain: Vec<Arc<dyn ToolMiddleware>> = vec![Arc::new(PermissionChecker)];
        let result = run_chain(&tool, &chain, &call, &ctx(BTreeSet::from([Permission::HostAccess])))
            .await
            .unwrap();
        assert!(matches!(result, ToolOutcome::Text { .. }));
    }

    #[tokio::test]
    async fn schema_validator_rejects_missing_required_field() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(NeedsHostTool));
        let validator = SchemaValidator::new(&reg);
        let tool = NeedsHostTool;
        let call = ToolCall {
            id: ToolCallId::new("c1"),
            name: "shell".into(),
            input: json!({}),
        };
        let chain: Vec<Arc<dyn ToolMiddleware>> = vec![Arc::new(validator)];
        let err = run_chain(&tool, &chain, &call, &ctx(BTreeSet::from([Permission::HostAccess])))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolInvocationError::Failed(_)));
    }

    #[tokio::test]
    async fn output_formatter_truncates_long_text() {
        struct LongTool;
        impl ToolDyn for LongTool {
            fn name(&self) -> &str {
                "long"
            }
            fn description(&self) -> &str {
                "emits long text"
            }
            fn input_schema(&self) -> serde_json::Value {
                json!({"type": "object"})
            }
            fn call(
                &self,
                _input: serde_json::Value,
            ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>>
            {
                Box::pin(async { Ok(ToolOutcome::Text { content: "x".repeat(100) }) })
            }
        }

        let tool = LongTool;
        let call = ToolCall {
            id: ToolCallId::new("c1"),
            name: "long".into(),
            input: json!({}),
        };
        let chain: Vec<Arc<dyn ToolMiddleware>> = vec![Arc::new(OutputFormatter::new(10))];
        let result = run_chain(&tool, &chain, &call, &ctx(BTreeSet::new())).await.unwrap();
        match result {
            ToolOutcome::Text { content } => assert!(content.starts_with("xxxxxxxxxx...")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_middleware_trips_on_slow_tool() {
        struct SlowTool;
        impl ToolDyn for SlowTool {
            fn name(&self) -> &str {
                "slow"
            }
            fn description(&self) -> &str {
                "sleeps"
            }
            fn input_schema(&self) -> serde_json::Value {
                json!({"type": "object"})
            }
            fn call(
                &self,
                _input: serde_json::Value,
            ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>>
            {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(ToolOutcome::Text { content: "done".into() })
                })
            }
        }

        let tool = SlowTool;
        let call = ToolCall {
            id: ToolCallId::new("c1"),
            name: "slow".into(),
            input: json!({}),
        };
        let chain: Vec<Arc<dyn ToolMiddleware>> =
            vec![Arc::new(TimeoutMiddleware::new(Duration::from_millis(5)))];
        let err = run_chain(&tool, &chain, &call, &ctx(BTreeSet::new())).await.unwrap_err();
        assert!(matches!(err, ToolInvocationError::Failed(_)));
    }
}
