//! Collector transport
//!
//! reqwest implementation of [`agnost_core::CollectorTransport`].

mod client;

pub use client::CollectorClient;
