//! Event types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_domain_enum_conversions;

/// Kind of primitive a recorded call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Tool,
    Resource,
    Prompt,
}

impl_domain_enum_conversions!(PrimitiveType {
    Tool => "tool",
    Resource => "resource",
    Prompt => "prompt",
});

/// A finished intercepted call, before privacy filtering and serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCall {
    pub primitive_type: PrimitiveType,
    pub primitive_name: String,
    pub arguments: Option<Value>,
    pub latency_ms: u64,
    pub success: bool,
    /// The call's result, or the extracted error message of a failed call.
    pub result: Option<Value>,
}

impl CompletedCall {
    pub fn tool(name: impl Into<String>) -> Self {
        Self {
            primitive_type: PrimitiveType::Tool,
            primitive_name: name.into(),
            arguments: None,
            latency_ms: 0,
            success: true,
            result: None,
        }
    }
}

/// Body of `POST /api/v1/capture-event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub org_id: String,
    pub session_id: String,
    pub primitive_type: PrimitiveType,
    pub primitive_name: String,
    /// Milliseconds.
    pub latency: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_collector_field_names() {
        let payload = EventPayload {
            org_id: "org-1".into(),
            session_id: "s-1".into(),
            primitive_type: PrimitiveType::Tool,
            primitive_name: "echo".into(),
            latency: 12,
            success: true,
            args: Some(r#"{"text":"hi"}"#.into()),
            result: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["primitive_type"], "tool");
        assert_eq!(json["latency"], 12);
        assert_eq!(json["args"], r#"{"text":"hi"}"#);
        assert!(json.get("result").is_none());
    }
}
