//! # Agnost Core
//!
//! Pipeline logic with no I/O of its own.
//!
//! This crate contains:
//! - Port interfaces (traits) for the host server, the collector and the
//!   event dispatcher
//! - Identity resolution, session lifecycle and event building
//! - The tool-call instrumentation wrapper
//!
//! ## Architecture Principles
//! - Only depends on `agnost-domain`
//! - No HTTP or platform code
//! - All external collaborators via traits

pub mod delivery;
pub mod events;
pub mod host;
pub mod identity;
pub mod instrumentation;
pub mod session;

pub use delivery::ports::{CollectorTransport, EnqueueOutcome, EventDispatcher};
pub use events::EventBuilder;
pub use host::ports::{HandlerError, HostServer, LifecycleHook, ToolHandler};
pub use identity::ports::{identify_fn, Environment, Identify};
pub use identity::IdentityResolver;
pub use instrumentation::ports::CallRecorder;
pub use instrumentation::{InstallOutcome, Instrumentation, InstrumentedHandler};
pub use session::SessionManager;
