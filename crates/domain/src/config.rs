//! Analytics configuration
//!
//! Built once at initialization and immutable afterwards. Values not supplied
//! by the caller fall back to the documented defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRY_DELAY_MS,
};
use crate::errors::{AgnostError, Result};
use crate::impl_domain_enum_conversions;

/// How queued events are delivered to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One worker, one event at a time, no retry.
    Sequential,
    /// Size/time windowed batches with per-event retry.
    #[default]
    Batched,
}

impl_domain_enum_conversions!(DeliveryMode {
    Sequential => "sequential",
    Batched => "batched",
});

/// SDK log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing` filters.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }

    /// Lenient parse: unknown values fall back to `Info`.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("Invalid LogLevel: {other}")),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// Operating parameters for one analytics client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Base URL of the collector.
    pub endpoint: String,
    /// Never record tool arguments.
    pub disable_input: bool,
    /// Never record tool results.
    pub disable_output: bool,
    /// Deliver in the background. When false the caller awaits delivery.
    pub enable_request_queuing: bool,
    pub delivery_mode: DeliveryMode,
    /// Events per batch before an early flush (batched mode).
    pub batch_size: usize,
    /// Retries after the first attempt (batched mode).
    pub max_retries: u32,
    #[serde(rename = "retry_delay_ms", with = "duration_ms")]
    pub retry_delay: Duration,
    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,
    /// Time window after which a partial batch is flushed.
    #[serde(rename = "flush_interval_ms", with = "duration_ms")]
    pub flush_interval: Duration,
    /// Ingress capacity; events beyond it are dropped.
    pub queue_capacity: usize,
    pub log_level: LogLevel,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            disable_input: false,
            disable_output: false,
            enable_request_queuing: true,
            delivery_mode: DeliveryMode::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_level: LogLevel::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Check the values that would make the client unusable.
    ///
    /// # Errors
    /// Returns `AgnostError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(AgnostError::Config("endpoint is required".into()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AgnostError::Config(format!(
                "endpoint must be an http(s) URL: {endpoint}"
            )));
        }
        if self.batch_size == 0 {
            return Err(AgnostError::Config("batch_size must be greater than zero".into()));
        }
        if self.queue_capacity == 0 {
            return Err(AgnostError::Config("queue_capacity must be greater than zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(AgnostError::Config("request_timeout must be greater than zero".into()));
        }
        if self.delivery_mode == DeliveryMode::Batched && self.flush_interval.is_zero() {
            return Err(AgnostError::Config(
                "flush_interval must be greater than zero in batched mode".into(),
            ));
        }
        Ok(())
    }

    /// Join the endpoint with a collector path, tolerating a trailing slash.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim().trim_end_matches('/'), path)
    }

    /// Total attempts per event in batched mode.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
