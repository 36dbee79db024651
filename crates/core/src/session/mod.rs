//! Session lifecycle
//!
//! Derives one key per logical connection and registers at most one remote
//! session per key.

mod manager;

pub use manager::SessionManager;
