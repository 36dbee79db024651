//! Session types

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::identity::UserIdentity;

/// Identity of one logical client connection to a host server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Connection metadata exposed by a host server adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Session id of the request currently being served, if any.
    pub request_session_id: Option<String>,
    /// Session id assigned by the transport layer, if any.
    pub transport_session_id: Option<String>,
    /// Transport type tag ("stdio", "http", ...).
    pub transport_kind: String,
    /// Name the connected client reported during initialization.
    pub client_name: Option<String>,
    pub remote_addr: Option<String>,
}

/// One registered connection context. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub client_name: String,
    pub connection_type: String,
    pub ip: Option<String>,
    pub tools: Vec<String>,
    pub user: Option<UserIdentity>,
}

impl Session {
    /// Fresh random (v4) session id.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Collector representation of this session.
    pub fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            session_id: self.session_id.clone(),
            client_config: self.client_name.clone(),
            connection_type: self.connection_type.clone(),
            ip: self.ip.clone().unwrap_or_default(),
            user_data: self.user.clone(),
            tools: self.tools.clone(),
        }
    }
}

/// Body of `POST /api/v1/capture-session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub session_id: String,
    pub client_config: String,
    pub connection_type: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserIdentity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}
