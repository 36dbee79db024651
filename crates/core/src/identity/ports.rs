//! Port interface for user identification

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use agnost_domain::{RequestContext, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Snapshot of process environment variables.
pub type Environment = HashMap<String, String>;

/// Caller-supplied user identification.
///
/// Returns an untyped value so that shape problems (no `userId`) are caught
/// and logged by the resolver instead of failing at the call site.
#[async_trait]
pub trait Identify: Send + Sync {
    async fn identify(
        &self,
        request: Option<&RequestContext>,
        env: &Environment,
    ) -> Result<Option<Value>>;
}

/// [`Identify`] implementation backed by an async closure.
pub struct FnIdentify<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Identify for FnIdentify<F>
where
    F: Fn(Option<RequestContext>, Environment) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>>> + Send,
{
    async fn identify(
        &self,
        request: Option<&RequestContext>,
        env: &Environment,
    ) -> Result<Option<Value>> {
        (self.f)(request.cloned(), env.clone()).await
    }
}

/// Wrap an async closure as an identify function.
///
/// ```
/// use agnost_core::identify_fn;
/// use serde_json::json;
///
/// let identify = identify_fn(|request, env| async move {
///     let user = request
///         .and_then(|r| r.header("x-user-id").map(str::to_owned))
///         .or_else(|| env.get("USER").cloned());
///     Ok(user.map(|id| json!({ "userId": id })))
/// });
/// # let _ = identify;
/// ```
pub fn identify_fn<F, Fut>(f: F) -> Arc<dyn Identify>
where
    F: Fn(Option<RequestContext>, Environment) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>>> + Send + 'static,
{
    Arc::new(FnIdentify { f })
}
