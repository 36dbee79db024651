//! User identification
//!
//! Wraps the caller-supplied identify function: failures and invalid results
//! become anonymous, results are memoized per request-context generation.

pub mod ports;
mod resolver;

pub use ports::{identify_fn, Environment, FnIdentify, Identify};
pub use resolver::IdentityResolver;
