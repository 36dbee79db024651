//! Port interface for completed-call recording

use agnost_domain::{CompletedCall, RequestContext};
use async_trait::async_trait;

/// Receives every call the instrumentation wrapper intercepts.
///
/// Implementations must not fail or panic: the wrapper awaits `record` before
/// handing the original outcome back to the host.
#[async_trait]
pub trait CallRecorder: Send + Sync {
    async fn record(&self, call: CompletedCall, request: Option<RequestContext>);
}
