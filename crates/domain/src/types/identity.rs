//! Caller identity and request context

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AgnostError, Result};

/// Caller identity used to segment sessions.
///
/// Serialized as `{"userId": ..., <traits>}`. The `user_id` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Arbitrary extra fields (email, role, plan...).
    #[serde(flatten)]
    pub traits: Map<String, Value>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), traits: Map::new() }
    }

    /// Attach an extra field.
    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.traits.insert(key.into(), value.into());
        self
    }

    /// Validate an untyped identify result.
    ///
    /// Accepts `userId` (or the legacy `user_id`) as a non-empty string or a
    /// number. Every other key becomes a trait.
    ///
    /// # Errors
    /// Returns `AgnostError::Identification` when the value is not an object
    /// or has no usable user id.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(AgnostError::Identification(
                "identify result must be an object".into(),
            ));
        };

        let raw = fields.remove("userId").or_else(|| fields.remove("user_id"));
        let user_id = match raw {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(AgnostError::Identification(
                    "identify result is missing a non-empty userId".into(),
                ))
            }
        };

        Ok(Self { user_id, traits: fields })
    }
}

/// Metadata of the request that triggered a tool call.
///
/// `id` is the generation marker for identity caching: a context with a new
/// id causes identity to be evaluated again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub id: String,
    /// Transport session the request arrived on, when the host exposes one.
    pub session_id: Option<String>,
    /// Request headers, lowercased names.
    pub headers: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}
