//! Collector and pipeline constants
//!
//! Centralized location for the wire paths, header names and defaults shared
//! by the SDK crates.

// Collector API
pub const DEFAULT_ENDPOINT: &str = "https://api.agnost.ai";
pub const CAPTURE_SESSION_PATH: &str = "/api/v1/capture-session";
pub const CAPTURE_EVENT_PATH: &str = "/api/v1/capture-event";
pub const ORG_ID_HEADER: &str = "X-Org-Id";
pub const USER_AGENT: &str = concat!("agnost-rust/", env!("CARGO_PKG_VERSION"));

// Configuration defaults
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

// Sequential delivery
pub const SEQUENTIAL_DISPATCH_DELAY_MS: u64 = 10;
pub const FLUSH_POLL_INTERVAL_MS: u64 = 25;

// Session defaults
pub const DEFAULT_CLIENT_NAME: &str = "unknown";
pub const DEFAULT_TRANSPORT_KIND: &str = "unknown";

/// Argument keys that carry the organization identifier and must never be
/// recorded as call data. Compared case-insensitively.
pub const ORG_ID_ARGUMENT_KEYS: &[&str] = &["orgid", "org_id", "organizationid", "organization_id"];
