use std::fmt::Debug;

use agnost_domain::constants::ORG_ID_ARGUMENT_KEYS;
use agnost_domain::{AnalyticsConfig, CompletedCall, EventPayload};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Builds [`EventPayload`]s for one organization.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    org_id: String,
    disable_input: bool,
    disable_output: bool,
}

impl EventBuilder {
    pub fn new(org_id: impl Into<String>, config: &AnalyticsConfig) -> Self {
        Self {
            org_id: org_id.into(),
            disable_input: config.disable_input,
            disable_output: config.disable_output,
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    /// Payload for `call` within `session_id`, with privacy switches applied.
    pub fn build(&self, session_id: impl Into<String>, call: CompletedCall) -> EventPayload {
        let args = if self.disable_input {
            None
        } else {
            call.arguments.as_ref().map(serialize_payload)
        };
        let result = if self.disable_output {
            None
        } else {
            call.result.as_ref().map(serialize_payload)
        };

        EventPayload {
            org_id: self.org_id.clone(),
            session_id: session_id.into(),
            primitive_type: call.primitive_type,
            primitive_name: call.primitive_name,
            latency: call.latency_ms,
            success: call.success,
            args,
            result,
        }
    }
}

/// Copy of `arguments` without org-identifier keys.
///
/// Only top-level keys of an object are inspected; matching is
/// case-insensitive. Non-object values are returned unchanged.
pub fn strip_org_identifiers(arguments: &Value) -> Value {
    match arguments {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(key, _)| !is_org_identifier(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_org_identifier(key: &str) -> bool {
    let key = key.to_lowercase();
    ORG_ID_ARGUMENT_KEYS.contains(&key.as_str())
}

/// Serialize a value for the collector. Never fails.
///
/// Strings pass through unchanged, everything else is rendered as JSON; a
/// value JSON cannot represent falls back to its `Debug` rendering.
pub fn serialize_payload<T: Serialize + Debug + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(text)) => text,
        Ok(json) => json.to_string(),
        Err(err) => {
            debug!(error = %err, "Payload is not JSON-serializable; using debug rendering");
            format!("{value:?}")
        }
    }
}
