//! HTTP plumbing shared by the collector transport

mod client;

pub use client::{HttpClient, HttpClientBuilder};
