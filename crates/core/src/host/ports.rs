//! Port interfaces for host servers
//!
//! These traits define the narrow capability set the pipeline needs from a
//! tool-invocation server. All host-specific field access lives in adapters.

use std::sync::Arc;

use agnost_domain::{ConnectionInfo, Result, ToolCallRequest, ToolCallResult};
use async_trait::async_trait;

/// Error type a tool handler propagates to its caller.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Callback fired by a host lifecycle event.
pub type LifecycleHook = Box<dyn Fn() + Send + Sync>;

/// The dispatch handler for `tools/call`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute a tool call.
    async fn call(&self, request: ToolCallRequest) -> std::result::Result<ToolCallResult, HandlerError>;

    /// True for handlers that already record analytics.
    fn is_instrumented(&self) -> bool {
        false
    }
}

/// Capabilities of an instrumented server.
#[async_trait]
pub trait HostServer: Send + Sync {
    /// Stable identifier of this server instance.
    fn instance_id(&self) -> &str;

    /// Connection metadata from the server's low-level layer.
    ///
    /// # Errors
    /// Fails when the server's connection state is not accessible.
    fn connection_info(&self) -> Result<ConnectionInfo>;

    /// Names of the currently registered tools, via the protocol's standard
    /// listing operation.
    async fn list_tools(&self) -> Result<Vec<String>>;

    /// The installed `tools/call` handler, if any has been registered yet.
    fn tool_call_handler(&self) -> Option<Arc<dyn ToolHandler>>;

    /// Replace the `tools/call` handler without touching other handlers.
    ///
    /// # Errors
    /// Fails when the handler registry is not accessible.
    fn set_tool_call_handler(&self, handler: Arc<dyn ToolHandler>) -> Result<()>;

    /// Register a hook fired when a transport attaches.
    fn on_connect(&self, hook: LifecycleHook);

    /// Register a hook fired after a tool is registered.
    fn on_tool_registered(&self, hook: LifecycleHook);
}
