//! Event construction
//!
//! Turns a completed call into the collector's event payload: privacy
//! switches, org-identifier stripping and payload serialization.

mod builder;

pub use builder::{serialize_payload, strip_org_identifiers, EventBuilder};
