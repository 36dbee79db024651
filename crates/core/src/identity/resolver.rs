use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agnost_domain::{RequestContext, UserIdentity};
use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::ports::{Environment, Identify};

struct CachedIdentity {
    epoch: u64,
    generation: Option<String>,
    identity: Option<UserIdentity>,
}

/// Resolves and memoizes the caller identity.
///
/// The cache is keyed by the request context id: a call carrying a new
/// context re-evaluates the identify function, a call without a context
/// reuses whatever was resolved last. Resolution is serialized, so concurrent
/// callers never invoke the identify function twice for one generation.
pub struct IdentityResolver {
    identify: Option<Arc<dyn Identify>>,
    env: Option<Environment>,
    epoch: AtomicU64,
    cache: Mutex<Option<CachedIdentity>>,
}

impl IdentityResolver {
    pub fn new(identify: Option<Arc<dyn Identify>>) -> Self {
        Self { identify, env: None, epoch: AtomicU64::new(0), cache: Mutex::new(None) }
    }

    /// Resolver that never identifies anyone.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Use a fixed environment snapshot instead of the process environment.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Drop the memoized identity so the next call evaluates again.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Resolve the identity for a request. `None` means anonymous.
    pub async fn resolve(&self, request: Option<&RequestContext>) -> Option<UserIdentity> {
        let identify = self.identify.as_ref()?;
        let generation = request.map(|r| r.id.clone());
        let epoch = self.epoch.load(Ordering::SeqCst);

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            let same_generation = generation.is_none() || cached.generation == generation;
            if cached.epoch == epoch && same_generation {
                return cached.identity.clone();
            }
        }

        let env = self.environment();
        let outcome = AssertUnwindSafe(identify.identify(request, &env)).catch_unwind().await;
        let identity = match outcome {
            Ok(Ok(Some(value))) => match UserIdentity::from_value(value) {
                Ok(identity) => {
                    debug!(user_id = %identity.user_id, "User identified");
                    Some(identity)
                }
                Err(err) => {
                    warn!(error = %err, "Discarding invalid identify result; continuing anonymously");
                    None
                }
            },
            Ok(Ok(None)) => None,
            Ok(Err(err)) => {
                warn!(error = %err, "Identify function failed; continuing anonymously");
                None
            }
            Err(_) => {
                warn!("Identify function panicked; continuing anonymously");
                None
            }
        };

        *cache = Some(CachedIdentity { epoch, generation, identity: identity.clone() });
        identity
    }

    fn environment(&self) -> Environment {
        match &self.env {
            Some(env) => env.clone(),
            None => std::env::vars().collect(),
        }
    }
}
