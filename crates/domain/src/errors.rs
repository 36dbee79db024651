//! Error types used throughout the SDK

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Agnost
///
/// Every variant maps to one failure class of the telemetry pipeline. None of
/// them is ever surfaced to an instrumented tool call; callers log and move on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AgnostError {
    /// Missing or invalid org id, endpoint or server handle.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The identify function failed or produced an invalid identity.
    #[error("Identification error: {0}")]
    Identification(String),

    /// The collector refused or never received a session.
    #[error("Session creation error: {0}")]
    SessionCreation(String),

    /// The collector refused an event.
    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The host server's handler registry could not be used.
    #[error("Instrumentation error: {0}")]
    Instrumentation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgnostError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Identification(_) => "identification",
            Self::SessionCreation(_) => "session_creation",
            Self::Delivery(_) => "delivery",
            Self::Network(_) => "network",
            Self::Serialization(_) => "serialization",
            Self::Instrumentation(_) => "instrumentation",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Agnost operations
pub type Result<T> = std::result::Result<T, AgnostError>;
