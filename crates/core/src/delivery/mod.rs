//! Event delivery contracts
//!
//! Ports for the collector transport and the queueing dispatcher. The worker
//! implementations live in `agnost-infra`.

pub mod ports;

pub use ports::{CollectorTransport, EnqueueOutcome, EventDispatcher};
