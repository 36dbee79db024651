//! Domain types and models

pub mod event;
pub mod identity;
pub mod session;
pub mod tool;

pub use event::{CompletedCall, EventPayload, PrimitiveType};
pub use identity::{RequestContext, UserIdentity};
pub use session::{ConnectionInfo, Session, SessionKey, SessionPayload};
pub use tool::{ToolCallRequest, ToolCallResult};
