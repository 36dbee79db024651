//! Tool invocation shapes of the tool-call protocol

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::identity::RequestContext;

/// A `tools/call` request as seen by the dispatch handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Option<Map<String, Value>>,
    /// Request metadata, when the transport provides it.
    pub context: Option<RequestContext>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// A `tools/call` result.
///
/// `is_error` is the protocol's application-level failure flag: the call
/// completed but the tool reports an error in `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    /// Successful result with one text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: vec![text_block(text.into())], ..Self::default() }
    }

    /// Application-level error result with one text block.
    pub fn error(message: impl Into<String>) -> Self {
        Self { content: vec![text_block(message.into())], is_error: Some(true), ..Self::default() }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first text block, used as the error message of a failed
    /// call.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| {
            (block.get("type").and_then(Value::as_str) == Some("text"))
                .then(|| block.get("text").and_then(Value::as_str))
                .flatten()
        })
    }
}

fn text_block(text: String) -> Value {
    json!({"type": "text", "text": text})
}
