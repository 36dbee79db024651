//! # Agnost Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP client and collector transport
//! - Event delivery workers (sequential and batched) with metrics
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `agnost-core`
//! - Contains all "impure" code (network I/O, environment, files)

pub mod collector;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use collector::CollectorClient;
pub use delivery::{DeliveryMetrics, DeliveryMetricsSnapshot, DeliveryWorker, DeliveryWorkerConfig};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
