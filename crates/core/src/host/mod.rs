//! Host server capability boundary
//!
//! The instrumented server is reached only through the [`ports::HostServer`]
//! trait. Each supported server family provides an adapter implementing it.

pub mod ports;

pub use ports::{HandlerError, HostServer, LifecycleHook, ToolHandler};
