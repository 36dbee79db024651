//! # Agnost
//!
//! Tool-call analytics for MCP servers.
//!
//! [`AgnostAnalytics`] wraps a server's `tools/call` handler and ships one
//! event per call (latency, success, arguments, result) to the Agnost
//! collector, grouped into sessions per client connection. The instrumented
//! server behaves exactly as before: results, errors and panics reach the
//! caller unchanged.
//!
//! Servers are reached through the [`HostServer`] trait; an adapter for a
//! concrete MCP server implementation provides instance identity,
//! connection metadata, tool listing and access to the `tools/call` handler.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agnost::{AgnostAnalytics, AnalyticsConfig, HostServer};
//!
//! # async fn example(server: Arc<dyn HostServer>) -> agnost::Result<()> {
//! let analytics = AgnostAnalytics::builder("my-org-id")
//!     .config(AnalyticsConfig { disable_output: true, ..AnalyticsConfig::default() })
//!     .track(&server)?;
//!
//! // ... serve requests ...
//!
//! analytics.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod analytics;

pub use agnost_core::{
    identify_fn, CallRecorder, CollectorTransport, Environment, HandlerError, HostServer, Identify,
    InstallOutcome, LifecycleHook, ToolHandler,
};
pub use agnost_domain::{
    AgnostError, AnalyticsConfig, CompletedCall, ConnectionInfo, DeliveryMode, LogLevel,
    PrimitiveType, RequestContext, Result, ToolCallRequest, ToolCallResult, UserIdentity,
};
pub use agnost_infra::config;
pub use agnost_infra::DeliveryMetricsSnapshot;
pub use analytics::{AgnostAnalytics, AgnostAnalyticsBuilder};

/// Instrument `host` with the given configuration.
///
/// Shorthand for `AgnostAnalytics::builder(org_id).config(config).track(host)`.
///
/// # Errors
/// See [`AgnostAnalyticsBuilder::track`].
pub fn track(
    host: &std::sync::Arc<dyn HostServer>,
    org_id: impl Into<String>,
    config: AnalyticsConfig,
) -> Result<AgnostAnalytics> {
    AgnostAnalytics::builder(org_id).config(config).track(host)
}
