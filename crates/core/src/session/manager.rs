use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agnost_domain::constants::{DEFAULT_CLIENT_NAME, DEFAULT_TRANSPORT_KIND};
use agnost_domain::{ConnectionInfo, RequestContext, Result, Session, SessionKey};
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::delivery::ports::CollectorTransport;
use crate::host::ports::HostServer;
use crate::identity::IdentityResolver;

/// Handle to the one creation task of a key.
type SessionSlot = Shared<BoxFuture<'static, Arc<Session>>>;

/// Session cache with single-flight creation.
///
/// Two shared maps: host instance id → session key, and session key → the
/// shared handle of a spawned creation task. The first caller for a key
/// spawns creation; every caller, concurrent or later, awaits the same
/// handle. Creation runs on its own task, so a caller that is cancelled while
/// waiting neither aborts it nor causes it to run again.
pub struct SessionManager {
    transport: Arc<dyn CollectorTransport>,
    identity: Arc<IdentityResolver>,
    keys: DashMap<String, SessionKey>,
    sessions: DashMap<SessionKey, SessionSlot>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn CollectorTransport>, identity: Arc<IdentityResolver>) -> Self {
        Self { transport, identity, keys: DashMap::new(), sessions: DashMap::new() }
    }

    /// Key of the logical connection served by `host`.
    ///
    /// Priority: the active request's session, then the transport session,
    /// then `"{transport_kind}-{unix_millis}"`. Cached per host instance; the
    /// first derived key wins.
    ///
    /// # Errors
    /// Fails when the host's connection state cannot be read and no key has
    /// been cached yet.
    pub fn session_key(&self, host: &dyn HostServer) -> Result<SessionKey> {
        if let Some(key) = self.keys.get(host.instance_id()) {
            return Ok(key.value().clone());
        }

        let derived = derive_key(&host.connection_info()?);
        let key = self.keys.entry(host.instance_id().to_string()).or_insert(derived).value().clone();
        debug!(instance = host.instance_id(), session_key = %key, "Derived session key");
        Ok(key)
    }

    /// Session id for `key`, creating and registering the session on first
    /// use.
    ///
    /// With `dummy` set, a fresh session is created and returned without
    /// touching the cache; this is the fallback when no key could be derived.
    /// Registration failures are logged and the locally generated id is used
    /// anyway. Must be called from within a Tokio runtime.
    pub async fn get_or_create_session(
        &self,
        host: &Arc<dyn HostServer>,
        key: &SessionKey,
        request: Option<&RequestContext>,
        dummy: bool,
    ) -> String {
        if dummy {
            let creation = self.creation(host, request);
            return creation.await.session_id.clone();
        }

        let cached = self.sessions.get(key).map(|slot| slot.value().clone());
        let slot = cached.unwrap_or_else(|| {
            self.sessions
                .entry(key.clone())
                .or_insert_with(|| self.spawn_creation(host, request))
                .value()
                .clone()
        });
        slot.await.session_id.clone()
    }

    /// Cached session for `key`, if creation has completed.
    pub fn session(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions.get(key).and_then(|slot| slot.peek().cloned())
    }

    /// Number of sessions created and cached.
    pub fn session_count(&self) -> usize {
        self.sessions.iter().filter(|slot| slot.value().peek().is_some()).count()
    }

    /// Drop every cached key, session and identity.
    pub fn clear(&self) {
        self.keys.clear();
        self.sessions.clear();
        self.identity.invalidate();
        debug!("Session caches cleared");
    }

    fn creation(
        &self,
        host: &Arc<dyn HostServer>,
        request: Option<&RequestContext>,
    ) -> BoxFuture<'static, Arc<Session>> {
        create_session(
            Arc::clone(&self.transport),
            Arc::clone(&self.identity),
            Arc::clone(host),
            request.cloned(),
        )
        .boxed()
    }

    fn spawn_creation(
        &self,
        host: &Arc<dyn HostServer>,
        request: Option<&RequestContext>,
    ) -> SessionSlot {
        let task = tokio::spawn(self.creation(host, request));
        async move {
            match task.await {
                Ok(session) => session,
                Err(err) => {
                    warn!(error = %err, "Session creation task failed; using a local session id");
                    Arc::new(local_session())
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn create_session(
    transport: Arc<dyn CollectorTransport>,
    identity: Arc<IdentityResolver>,
    host: Arc<dyn HostServer>,
    request: Option<RequestContext>,
) -> Arc<Session> {
    let session_id = Session::generate_id();

    let info = host.connection_info().unwrap_or_else(|err| {
        debug!(error = %err, "Connection info unavailable; using defaults");
        ConnectionInfo::default()
    });
    let user = identity.resolve(request.as_ref()).await;
    let tools = match host.list_tools().await {
        Ok(tools) => tools,
        Err(err) => {
            warn!(error = %err, "Failed to list host tools");
            Vec::new()
        }
    };

    let session = Session {
        session_id,
        client_name: non_empty(info.client_name).unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
        connection_type: non_empty(Some(info.transport_kind)).unwrap_or_default(),
        ip: non_empty(info.remote_addr),
        tools,
        user,
    };

    match transport.create_session(&session.to_payload()).await {
        Ok(()) => info!(
            session_id = %session.session_id,
            tools = session.tools.len(),
            identified = session.user.is_some(),
            "Session created"
        ),
        Err(err) => warn!(
            session_id = %session.session_id,
            error = %err,
            "Session registration failed; continuing with local session id"
        ),
    }

    Arc::new(session)
}

fn local_session() -> Session {
    Session {
        session_id: Session::generate_id(),
        client_name: DEFAULT_CLIENT_NAME.to_string(),
        connection_type: String::new(),
        ip: None,
        tools: Vec::new(),
        user: None,
    }
}

fn derive_key(info: &ConnectionInfo) -> SessionKey {
    if let Some(id) = non_empty(info.request_session_id.clone()) {
        return SessionKey::new(id);
    }
    if let Some(id) = non_empty(info.transport_session_id.clone()) {
        return SessionKey::new(id);
    }

    let kind = if info.transport_kind.trim().is_empty() {
        DEFAULT_TRANSPORT_KIND
    } else {
        info.transport_kind.as_str()
    };
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    SessionKey::new(format!("{kind}-{millis}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
