use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use agnost::{
    AgnostError, ConnectionInfo, HandlerError, HostServer, LifecycleHook, Result, ToolCallRequest,
    ToolCallResult, ToolHandler,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

/// In-memory tool server exposing the capabilities the SDK needs.
pub struct TestHost {
    id: String,
    info: Mutex<Option<ConnectionInfo>>,
    tools: Mutex<Vec<String>>,
    handler: Mutex<Option<Arc<dyn ToolHandler>>>,
    connect_hooks: Mutex<Vec<LifecycleHook>>,
    tool_hooks: Mutex<Vec<LifecycleHook>>,
}

impl TestHost {
    /// A stdio server with no tools registered yet.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            id: "test-host".into(),
            info: Mutex::new(Some(ConnectionInfo {
                transport_kind: "stdio".into(),
                client_name: Some("test-client".into()),
                ..ConnectionInfo::default()
            })),
            tools: Mutex::new(Vec::new()),
            handler: Mutex::new(None),
            connect_hooks: Mutex::new(Vec::new()),
            tool_hooks: Mutex::new(Vec::new()),
        })
    }

    /// A server with the calculator tools registered.
    pub fn calculator() -> Arc<Self> {
        let host = Self::empty();
        for tool in ["add", "divide", "fail", "slow"] {
            host.register_tool(tool);
        }
        host
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn HostServer> {
        Arc::clone(self) as Arc<dyn HostServer>
    }

    /// Make `connection_info` fail, as when the low-level server is gone.
    pub fn break_connection_info(&self) {
        *self.info.lock() = None;
    }

    /// Register a tool. The first registration installs the dispatcher; hooks
    /// run after the registry locks are released.
    pub fn register_tool(&self, name: &str) {
        self.tools.lock().push(name.to_string());
        self.handler.lock().get_or_insert_with(|| Arc::new(Calculator) as Arc<dyn ToolHandler>);
        run_hooks(&self.tool_hooks);
    }

    pub fn connect(&self) {
        run_hooks(&self.connect_hooks);
    }

    /// Dispatch a `tools/call` request through whatever handler is installed.
    pub async fn call(&self, request: ToolCallRequest) -> std::result::Result<ToolCallResult, HandlerError> {
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => handler.call(request).await,
            None => Err("no tools registered".into()),
        }
    }

    pub fn is_instrumented(&self) -> bool {
        self.handler.lock().as_ref().is_some_and(|h| h.is_instrumented())
    }
}

fn run_hooks(hooks: &Mutex<Vec<LifecycleHook>>) {
    let taken = std::mem::take(&mut *hooks.lock());
    for hook in &taken {
        hook();
    }
    hooks.lock().extend(taken);
}

#[async_trait]
impl HostServer for TestHost {
    fn instance_id(&self) -> &str {
        &self.id
    }

    fn connection_info(&self) -> Result<ConnectionInfo> {
        self.info
            .lock()
            .clone()
            .ok_or_else(|| AgnostError::Instrumentation("low-level server unavailable".into()))
    }

    async fn list_tools(&self) -> Result<Vec<String>> {
        Ok(self.tools.lock().clone())
    }

    fn tool_call_handler(&self) -> Option<Arc<dyn ToolHandler>> {
        self.handler.lock().clone()
    }

    fn set_tool_call_handler(&self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        *self.handler.lock() = Some(handler);
        Ok(())
    }

    fn on_connect(&self, hook: LifecycleHook) {
        self.connect_hooks.lock().push(hook);
    }

    fn on_tool_registered(&self, hook: LifecycleHook) {
        self.tool_hooks.lock().push(hook);
    }
}

#[derive(Debug)]
pub struct ToolFailure(pub String);

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ToolFailure {}

/// Dispatcher for the test tools: `add`, `divide`, `fail`, `slow`.
pub struct Calculator;

#[async_trait]
impl ToolHandler for Calculator {
    async fn call(&self, request: ToolCallRequest) -> std::result::Result<ToolCallResult, HandlerError> {
        let arg = |key: &str| {
            request.arguments.as_ref().and_then(|a| a.get(key)).and_then(Value::as_f64).unwrap_or(0.0)
        };

        match request.name.as_str() {
            "add" => Ok(ToolCallResult::text((arg("a") + arg("b")).to_string())),
            "divide" if arg("b") == 0.0 => Ok(ToolCallResult::error("division by zero")),
            "divide" => Ok(ToolCallResult::text((arg("a") / arg("b")).to_string())),
            "fail" => Err(Box::new(ToolFailure("backend unavailable".into()))),
            "slow" => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(ToolCallResult::text("done"))
            }
            other => Err(Box::new(ToolFailure(format!("unknown tool: {other}")))),
        }
    }
}
