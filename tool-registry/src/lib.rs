//! Tool interface, registry, and tool groups for agentex (§3 "Tool", §6
//! "Tool registration").
//!
//! Defines [`ToolDyn`] for object-safe tool abstraction, [`ToolRegistry`]
//! for flat collections of tools, and [`ToolGroupRegistry`] for the
//! role-based grouping the Supervisor planner and tool loop use to
//! resolve a required capability at runtime. The middleware pipeline in
//! [`middleware`] wraps tool execution with cross-cutting concerns
//! (permissions, schema validation, timeouts, retries) the same way it
//! always has here — only the dependency on an outside crate for the
//! call/context/output types has been removed in favor of the types
//! defined below.

#![deny(missing_docs)]

pub mod builtin;
pub mod middleware;

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agentex_core::ControlSignal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by registry/group lookups and by the tool loop around a
/// call, as opposed to what a tool body itself returns (see
/// [`ToolInvocationError`]).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The call did not complete within its allotted time.
    #[error("tool timed out: {0}")]
    Timeout(String),

    /// Input failed schema validation before the tool was invoked.
    #[error("invalid input for tool {tool}: {reason}")]
    InvalidInput {
        /// The tool's name.
        tool: String,
        /// Why validation failed.
        reason: String,
    },

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// What a tool call settles to (§3 "Tool": `call(jsonString) → {Text |
/// WithArtifact | Error}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Plain text result, used as-is.
    Text {
        /// The text content.
        content: String,
    },
    /// Text result plus a structured artifact (e.g. a file produced, a
    /// record created).
    WithArtifact {
        /// The text content.
        content: String,
        /// The structured artifact.
        artifact: serde_json::Value,
    },
    /// The tool completed but reports failure as data, not as an error.
    Error {
        /// Why the tool considers this a failure.
        message: String,
    },
}

impl ToolOutcome {
    /// Fold to the single string the tool loop appends to history (§4.4
    /// step 2c): `Text`/`WithArtifact` content used as-is, `Error`
    /// prefixed with `"Error: "`.
    pub fn into_history_text(self) -> String {
        match self {
            ToolOutcome::Text { content } => content,
            ToolOutcome::WithArtifact { content, .. } => content,
            ToolOutcome::Error { message } => format!("Error: {message}"),
        }
    }
}

/// What a tool body can raise: an ordinary failure (folded into
/// [`ToolOutcome::Error`] by the loop) or a control-flow signal that
/// must bypass it (§4.4, §7).
#[derive(Debug)]
pub enum ToolInvocationError {
    /// The tool failed; becomes `ToolOutcome::Error { message }`.
    Failed(String),
    /// A control-flow signal raised from inside a tool body (e.g. an
    /// awaitable tool requesting confirmation).
    ControlFlow(ControlSignal),
}

impl ToolInvocationError {
    /// Construct a plain failure.
    pub fn failed(message: impl Into<String>) -> Self {
        ToolInvocationError::Failed(message.into())
    }
}

/// Coarse-grained capability a tool or tool group declares it needs
/// (§6 "Tool registration").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Access to the local host (filesystem, process spawning).
    HostAccess,
    /// Access to the network.
    InternetAccess,
}

/// The static description surfaced to an LLM as a function-calling
/// tool definition (§3 "Tool": `{name, description, inputSchema}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's unique name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Build a definition whose `input_schema` is derived from `T`'s
    /// [`schemars::JsonSchema`] impl rather than hand-written JSON.
    ///
    /// Meant for tools backed by a typed input struct, including a
    /// Matryoshka tool's [`ToolDyn::inner_tools`] and a `TypeRequest`
    /// awaitable's payload shape (§4.4, §4.6).
    pub fn for_type<T: schemars::JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json_schema_for::<T>(),
        }
    }
}

/// Derive a JSON Schema document for `T` via `schemars`.
pub fn json_schema_for<T: schemars::JsonSchema>() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(serde_json::Value::Null)
}

/// Object-safe trait for tool implementations.
///
/// Any tool source (local function, subprocess, remote call) implements
/// this trait. Tools are stored as `Arc<dyn ToolDyn>` in [`ToolRegistry`].
pub trait ToolDyn: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Capabilities this tool needs, for [`Permission`] checks.
    fn required_permissions(&self) -> BTreeSet<Permission> {
        BTreeSet::new()
    }

    /// Tools to add to `available_tools` once this tool is invoked
    /// (§4.4 "Progressive disclosure (Matryoshka)"). Empty for ordinary
    /// tools; a Matryoshka tool overrides this to expand its surface on
    /// demand instead of advertising everything up front.
    fn inner_tools(&self) -> Vec<Arc<dyn ToolDyn>> {
        Vec::new()
    }

    /// Whether this tool should be removed from `available_tools` once
    /// it's been invoked (paired with [`inner_tools`](Self::inner_tools)).
    fn remove_on_invoke(&self) -> bool {
        false
    }

    /// Execute the tool with the given input.
    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>>;

    /// The static definition surfaced to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Flat registry of tools available to a tool loop invocation.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Remove a tool by name, if registered (§4.4 "Progressive disclosure":
    /// a Matryoshka tool may ask to be removed from `available_tools` once
    /// invoked).
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ToolDyn>> {
        self.tools.remove(name)
    }

    /// Iterate over all registered tools.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolDyn>> {
        self.tools.values()
    }

    /// Definitions for every registered tool, as surfaced to an LLM.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata for a named collection of tools (§6 "Tool registration":
/// `{role, name, provider, permissions, version}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolGroup {
    /// The role this group fills (e.g. `"web-search"`, `"code-exec"`).
    pub role: String,
    /// The group's own name.
    pub name: String,
    /// Who supplies the group (e.g. a vendor or internal team).
    pub provider: String,
    /// Capabilities every tool in the group needs.
    pub permissions: BTreeSet<Permission>,
    /// The group's version.
    pub version: String,
}

/// Registry of [`ToolGroup`]s, keyed by role, each holding its member
/// tools. A Supervisor planner or agent author asks for a required
/// group by role and either gets it resolved or a failure message
/// (§6 "Tool registration").
#[derive(Default)]
pub struct ToolGroupRegistry {
    groups: HashMap<String, (ToolGroup, Vec<Arc<dyn ToolDyn>>)>,
}

impl ToolGroupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }

    /// Register a group's metadata alongside its member tools, keyed by
    /// `group.role`. Overwrites any group already registered under that
    /// role.
    pub fn register(&mut self, group: ToolGroup, tools: Vec<Arc<dyn ToolDyn>>) {
        self.groups.insert(group.role.clone(), (group, tools));
    }

    /// Resolve a required group by role, or a failure message explaining
    /// why it could not be resolved.
    pub fn resolve_required(&self, role: &str) -> Result<(&ToolGroup, &[Arc<dyn ToolDyn>]), String> {
        let resolved = self.groups.get(role).map(|(group, tools)| (group, tools.as_slice()));
        if resolved.is_none() {
            tracing::warn!(role, "no tool group registered for required role");
        }
        resolved.ok_or_else(|| format!("no tool group registered for role '{role}'"))
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether any groups are registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn tool_dyn_is_object_safe() {
        _assert_send_sync::<Arc<dyn ToolDyn>>();
    }

    #[derive(schemars::JsonSchema)]
    struct ShellCommandInput {
        cmd: String,
        timeout_secs: Option<u32>,
    }

    #[test]
    fn tool_definition_for_type_derives_schema() {
        let def = ToolDefinition::for_type::<ShellCommandInput>("shell", "runs a shell command");
        let schema = def.input_schema.as_object().expect("object schema");
        assert_eq!(schema.get("type").and_then(|t| t.as_str()), Some("object"));
        let required = schema.get("required").and_then(|r| r.as_array()).expect("required array");
        assert!(required.iter().any(|v| v == "cmd"));
        assert!(!required.iter().any(|v| v == "timeout_secs"));
    }

    #[test]
    fn outcome_folds_to_history_text() {
        assert_eq!(
            ToolOutcome::Text { content: "ok".into() }.into_history_text(),
            "ok"
        );
        assert_eq!(
            ToolOutcome::WithArtifact {
                content: "done".into(),
                artifact: json!({"id": 1}),
            }
            .into_history_text(),
            "done"
        );
        assert_eq!(
            ToolOutcome::Error { message: "boom".into() }.into_history_text(),
            "Error: boom"
        );
    }

    struct EchoTool;

    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input back"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        fn call(
            &self,
            input: serde_json::Value,
        ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>>
        {
            Box::pin(async move {
                Ok(ToolOutcome::Text {
                    content: input.to_string(),
                })
            })
        }
    }

    struct FailTool;

    impl ToolDyn for FailTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        fn call(
            &self,
            _input: serde_json::Value,
        ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + '_>>
        {
            Box::pin(async { Err(ToolInvocationError::failed("always fails")) })
        }
    }

    #[test]
    fn registry_add_and_get() {
        let mut reg = ToolRegistry::new();
        assert!(reg.is_empty());

        reg.register(Arc::new(EchoTool));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("echo").is_some());
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn registry_remove() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        assert!(reg.remove("echo").is_some());
        assert!(reg.get("echo").is_none());
        assert!(reg.remove("echo").is_none());
    }

    #[test]
    fn registry_definitions() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg.register(Arc::new(FailTool));

        let names: Vec<String> = reg.definitions().into_iter().map(|d| d.name).collect();
        assert!(names.contains(&"echo".to_string()));
        assert!(names.contains(&"fail".to_string()));
    }

    #[tokio::test]
    async fn registry_call_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));

        let tool = reg.get("echo").unwrap();
        let result = tool.call(json!({"msg": "hello"})).await.unwrap();
        match result {
            ToolOutcome::Text { content } => assert_eq!(content, json!({"msg": "hello"}).to_string()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn registry_call_failing_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FailTool));

        let tool = reg.get("fail").unwrap();
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolInvocationError::Failed(_)));
    }

    #[test]
    fn tool_group_resolution() {
        let mut groups = ToolGroupRegistry::new();
        assert!(groups.resolve_required("web-search").is_err());

        groups.register(
            ToolGroup {
                role: "web-search".into(),
                name: "bing".into(),
                provider: "acme".into(),
                permissions: BTreeSet::from([Permission::InternetAccess]),
                version: "1.0.0".into(),
            },
            vec![Arc::new(EchoTool)],
        );

        let (group, tools) = groups.resolve_required("web-search").unwrap();
        assert_eq!(group.name, "bing");
        assert_eq!(tools.len(), 1);
    }
}
