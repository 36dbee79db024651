//! # Agnost Domain
//!
//! Data types shared by every Agnost crate.
//!
//! This crate contains:
//! - Session, identity and event payload types
//! - The analytics configuration and its defaults
//! - Domain error types and Result definitions
//! - Collector constants
//!
//! ## Architecture
//! - No dependencies on other Agnost crates
//! - No I/O, no async runtime

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
