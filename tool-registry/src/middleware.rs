//! Middleware types for the tool execution pipeline.
//!
//! Middleware wraps tool execution with cross-cutting concerns like
//! validation, permissions, logging, and output formatting.
//!
//! The pattern is identical to axum's `from_fn` — each middleware
//! receives a `Next` that it can call to continue the chain, or
//! skip to short-circuit.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agentex_core::{AwaitableId, ProcessId, ToolCallId};

use crate::{Permission, ToolDyn, ToolInvocationError, ToolOutcome};

/// A tool call in flight through the middleware pipeline.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Unique identifier for this tool call (from the model).
    pub id: ToolCallId,
    /// Name of the tool being called.
    pub name: String,
    /// JSON input arguments.
    pub input: serde_json::Value,
}

/// Per-call context threaded through the middleware chain: which process
/// and which attempt this call belongs to, and what permissions the
/// caller has been granted.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// The process this call is running within.
    pub process_id: ProcessId,
    /// Which iteration of the tool loop this call belongs to.
    pub iteration: u32,
    /// Permissions granted to the call site.
    pub granted_permissions: BTreeSet<Permission>,
    /// An awaitable this call resolves, if it was issued to answer one.
    pub resolves_awaitable: Option<AwaitableId>,
}

/// Middleware that wraps tool execution.
///
/// Each middleware receives the call, context, and a [`Next`] to continue the chain.
/// Middleware can:
/// - Inspect/modify the call before passing it on
/// - Short-circuit by returning without calling `next.run()`
/// - Inspect/modify the result after the tool executes
///
/// Uses boxed futures for dyn-compatibility (heterogeneous middleware collections).
pub trait ToolMiddleware: Send + Sync {
    /// Process a tool call, optionally delegating to the next middleware/tool.
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>>;
}

/// The remaining middleware chain plus the underlying tool.
///
/// Consumed on call to prevent double-invoke.
pub struct Next<'a> {
    tool: &'a dyn ToolDyn,
    middleware: &'a [Arc<dyn ToolMiddleware>],
}

impl<'a> Next<'a> {
    /// Create a new Next from a tool and middleware slice.
    pub(crate) fn new(tool: &'a dyn ToolDyn, middleware: &'a [Arc<dyn ToolMiddleware>]) -> Self {
        Self { tool, middleware }
    }

    /// The tool at the end of this chain, for middleware that needs to
    /// inspect its static metadata (e.g. required permissions) before
    /// deciding whether to call `run`.
    pub fn tool(&self) -> &'a dyn ToolDyn {
        self.tool
    }

    /// Continue the middleware chain, eventually calling the tool.
    pub async fn run(self, call: &'a ToolCall, ctx: &'a ToolContext) -> Result<ToolOutcome, ToolInvocationError> {
        if let Some((head, tail)) = self.middleware.split_first() {
            let next = Next::new(self.tool, tail);
            head.process(call, ctx, next).await
        } else {
            self.tool.call(call.input.clone()).await
        }
    }
}

/// Run a tool call through a middleware chain, then the tool itself.
pub async fn run_chain(
    tool: &dyn ToolDyn,
    middleware: &[Arc<dyn ToolMiddleware>],
    call: &ToolCall,
    ctx: &ToolContext,
) -> Result<ToolOutcome, ToolInvocationError> {
    tracing::trace!(tool = %call.name, call_id = %call.id, "running tool middleware chain");
    Next::new(tool, middleware).run(call, ctx).await
}

/// Wrapper that implements `ToolMiddleware` for a closure returning a boxed future.
struct MiddlewareFn<F> {
    f: F,
}

impl<F> ToolMiddleware for MiddlewareFn<F>
where
    F: for<'a> Fn(
            &'a ToolCall,
            &'a ToolContext,
            Next<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>>
        + Send
        + Sync,
{
    fn process<'a>(
        &'a self,
        call: &'a ToolCall,
        ctx: &'a ToolContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>> {
        (self.f)(call, ctx, next)
    }
}

/// Create middleware from a closure (like axum's `from_fn`).
///
/// The closure must return a `Box::pin(async move { ... })` future.
///
/// # Example
///
/// ```ignore
/// use agentex_tool::middleware::tool_middleware_fn;
///
/// let logging = tool_middleware_fn(|call, ctx, next| {
///     Box::pin(async move {
///         let result = next.run(call, ctx).await;
///         result
///     })
/// });
/// ```
#[must_use]
pub fn tool_middleware_fn<F>(f: F) -> impl ToolMiddleware
where
    F: for<'a> Fn(
            &'a ToolCall,
            &'a ToolContext,
            Next<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolInvocationError>> + Send + 'a>>
        + Send
        + Sync,
{
    MiddlewareFn { f }
}
