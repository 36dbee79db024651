use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use agnost_domain::{CompletedCall, ToolCallRequest, ToolCallResult};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use super::ports::CallRecorder;
use crate::events::strip_org_identifiers;
use crate::host::ports::{HandlerError, ToolHandler};

/// A `tools/call` handler that records every invocation of the handler it
/// wraps.
///
/// The wrapped handler sees the request unmodified and its outcome (value,
/// error or panic) is handed back to the host unchanged once the call has
/// been recorded.
pub struct InstrumentedHandler {
    inner: Arc<dyn ToolHandler>,
    recorder: Arc<dyn CallRecorder>,
}

impl InstrumentedHandler {
    pub fn new(inner: Arc<dyn ToolHandler>, recorder: Arc<dyn CallRecorder>) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl ToolHandler for InstrumentedHandler {
    async fn call(&self, request: ToolCallRequest) -> Result<ToolCallResult, HandlerError> {
        let name = request.name.clone();
        let arguments =
            request.arguments.clone().map(|args| strip_org_identifiers(&Value::Object(args)));
        let context = request.context.clone();

        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.inner.call(request)).catch_unwind().await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (success, result) = match &outcome {
            Ok(Ok(result)) if result.is_error() => (false, Some(error_message(result))),
            Ok(Ok(result)) => (true, serde_json::to_value(result).ok()),
            Ok(Err(err)) => (false, Some(Value::String(err.to_string()))),
            Err(payload) => (false, Some(Value::String(panic_message(&**payload)))),
        };
        debug!(tool = %name, success, latency_ms, "Tool call intercepted");

        let call = CompletedCall { arguments, latency_ms, success, result, ..CompletedCall::tool(name) };
        self.recorder.record(call, context).await;

        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn is_instrumented(&self) -> bool {
        true
    }
}

fn error_message(result: &ToolCallResult) -> Value {
    match result.first_text() {
        Some(text) => Value::String(text.to_string()),
        None => serde_json::to_value(result).unwrap_or(Value::Null),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool handler panicked".to_string()
    }
}
