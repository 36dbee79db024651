use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use agnost_core::{
    CallRecorder, CollectorTransport, Environment, EventBuilder, EventDispatcher, HostServer,
    Identify, IdentityResolver, InstallOutcome, Instrumentation, SessionManager,
};
use agnost_domain::{
    AgnostError, AnalyticsConfig, CompletedCall, RequestContext, Result, Session, SessionKey,
};
use agnost_infra::delivery::send_once;
use agnost_infra::{logging, CollectorClient, DeliveryMetrics, DeliveryMetricsSnapshot};
use agnost_infra::{DeliveryWorker, DeliveryWorkerConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Analytics client for one host server instance.
///
/// Created by [`AgnostAnalyticsBuilder::track`]. Dropping the client does not
/// detach the wrapper from the server; call [`shutdown`](Self::shutdown) to
/// deliver what is queued and stop recording.
pub struct AgnostAnalytics {
    inner: Arc<Pipeline>,
    instrumentation: Arc<Instrumentation>,
    initial_session: Mutex<Option<JoinHandle<()>>>,
}

/// Builder for [`AgnostAnalytics`].
pub struct AgnostAnalyticsBuilder {
    org_id: String,
    config: AnalyticsConfig,
    identify: Option<Arc<dyn Identify>>,
    transport: Option<Arc<dyn CollectorTransport>>,
    environment: Option<Environment>,
    init_logging: bool,
}

impl AgnostAnalytics {
    pub fn builder(org_id: impl Into<String>) -> AgnostAnalyticsBuilder {
        AgnostAnalyticsBuilder {
            org_id: org_id.into(),
            config: AnalyticsConfig::default(),
            identify: None,
            transport: None,
            environment: None,
            init_logging: true,
        }
    }

    /// Record a completed call outside the wrapper (resources, prompts, or
    /// calls the host dispatches itself).
    ///
    /// Returns whether the event was accepted: queued when request queueing
    /// is enabled, acknowledged by the collector otherwise.
    pub async fn record_event(&self, call: CompletedCall) -> bool {
        self.inner.record_event(call, None).await
    }

    /// Deliver everything queued and wait for it, bounded by the delivery
    /// retry budget.
    pub async fn flush(&self) {
        self.inner.dispatcher.flush().await;
    }

    /// Flush, stop the delivery worker, then drop queued events and cached
    /// sessions. Later calls are no-ops; calls intercepted afterwards are not
    /// recorded.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            debug!("Analytics already shut down");
            return;
        }

        info!(org_id = %self.inner.org_id, "Shutting down analytics");

        if let Some(handle) = self.initial_session.lock().take() {
            handle.abort();
        }

        let dispatcher = &self.inner.dispatcher;
        dispatcher.flush().await;
        if dispatcher.is_running() {
            if let Err(err) = dispatcher.stop().await {
                warn!(error = %err, "Delivery worker did not stop cleanly");
            }
        }

        let discarded = dispatcher.clear();
        if discarded > 0 {
            warn!(discarded, "Discarded undelivered events at shutdown");
        }
        self.inner.sessions.clear();

        info!("Analytics shut down");
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.inner.config
    }

    pub fn org_id(&self) -> &str {
        &self.inner.org_id
    }

    /// Whether the tool-call wrapper is in place.
    pub fn is_instrumented(&self) -> bool {
        self.instrumentation.is_installed()
    }

    /// Session registered for the host's current connection, if any.
    pub fn current_session(&self) -> Option<Arc<Session>> {
        let host = self.inner.host.upgrade()?;
        let key = self.inner.sessions.session_key(host.as_ref()).ok()?;
        self.inner.sessions.session(&key)
    }

    /// Events waiting or in flight.
    pub fn pending_events(&self) -> usize {
        self.inner.dispatcher.pending()
    }

    pub fn metrics(&self) -> DeliveryMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl AgnostAnalyticsBuilder {
    pub fn config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// User identification for sessions.
    pub fn identify(mut self, identify: Arc<dyn Identify>) -> Self {
        self.identify = Some(identify);
        self
    }

    /// Replace the HTTP collector client.
    pub fn transport(mut self, transport: Arc<dyn CollectorTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Fixed environment for the identify function instead of the process
    /// environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Skip installing the SDK's log subscriber.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Validate the configuration, start delivery and instrument `host`.
    ///
    /// Must be called from within a Tokio runtime when request queueing is
    /// enabled. The first session is registered in the background.
    ///
    /// # Errors
    /// - `AgnostError::Config` for an empty org id or invalid configuration
    /// - `AgnostError::Internal` when the delivery worker cannot start
    /// - `AgnostError::Instrumentation` when the host refuses the wrapper
    pub fn track(self, host: &Arc<dyn HostServer>) -> Result<AgnostAnalytics> {
        let org_id = self.org_id.trim().to_string();
        if org_id.is_empty() {
            return Err(AgnostError::Config("organization id is required".into()));
        }
        self.config.validate()?;

        if self.init_logging {
            logging::init(self.config.log_level);
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(CollectorClient::new(&org_id, &self.config)?),
        };

        let mut identity = IdentityResolver::new(self.identify);
        if let Some(environment) = self.environment {
            identity = identity.with_environment(environment);
        }

        let metrics = Arc::new(DeliveryMetrics::new());
        let dispatcher = DeliveryWorker::new(
            Arc::clone(&transport),
            DeliveryWorkerConfig::from(&self.config),
            Arc::clone(&metrics),
        );
        if self.config.enable_request_queuing {
            dispatcher.start()?;
        }

        let inner = Arc::new(Pipeline {
            sessions: SessionManager::new(Arc::clone(&transport), Arc::new(identity)),
            events: EventBuilder::new(org_id.clone(), &self.config),
            org_id,
            config: self.config,
            host: Arc::downgrade(host),
            transport,
            dispatcher,
            metrics,
            shutdown: AtomicBool::new(false),
        });

        let recorder: Arc<dyn CallRecorder> = inner.clone();
        let instrumentation = Instrumentation::new(host, recorder);
        match instrumentation.install() {
            InstallOutcome::Failed(err) => return Err(err),
            outcome => debug!(?outcome, "Instrumentation attempted"),
        }

        let initial_session = spawn_initial_session(&inner);

        info!(
            org_id = %inner.org_id,
            instance = host.instance_id(),
            mode = %inner.config.delivery_mode,
            queued = inner.config.enable_request_queuing,
            "Server tracking enabled"
        );

        Ok(AgnostAnalytics { inner, instrumentation, initial_session: Mutex::new(initial_session) })
    }
}

fn spawn_initial_session(inner: &Arc<Pipeline>) -> Option<JoinHandle<()>> {
    if tokio::runtime::Handle::try_current().is_err() {
        debug!("No Tokio runtime; initial session deferred to first call");
        return None;
    }

    let inner = Arc::clone(inner);
    Some(tokio::spawn(async move {
        let session_id = inner.session_id(None).await;
        debug!(%session_id, "Initial session ready");
    }))
}

/// Shared state behind the client and every wrapped handler.
struct Pipeline {
    org_id: String,
    config: AnalyticsConfig,
    host: Weak<dyn HostServer>,
    sessions: SessionManager,
    events: EventBuilder,
    transport: Arc<dyn CollectorTransport>,
    dispatcher: DeliveryWorker,
    metrics: Arc<DeliveryMetrics>,
    shutdown: AtomicBool,
}

impl Pipeline {
    /// Session id for the host's current connection. Falls back to a fresh
    /// uncached session when no key can be derived.
    async fn session_id(&self, request: Option<&RequestContext>) -> String {
        let Some(host) = self.host.upgrade() else {
            debug!("Host server dropped; using an unregistered session id");
            return Session::generate_id();
        };

        match self.sessions.session_key(host.as_ref()) {
            Ok(key) => self.sessions.get_or_create_session(&host, &key, request, false).await,
            Err(err) => {
                debug!(error = %err, "Session key unavailable; creating a standalone session");
                let key = SessionKey::new(String::new());
                self.sessions.get_or_create_session(&host, &key, request, true).await
            }
        }
    }

    async fn record_event(&self, call: CompletedCall, request: Option<RequestContext>) -> bool {
        if self.shutdown.load(Ordering::SeqCst) {
            debug!(primitive = %call.primitive_name, "Analytics shut down; event not recorded");
            return false;
        }

        let session_id = self.session_id(request.as_ref()).await;
        let event = self.events.build(session_id, call);
        debug!(
            primitive = %event.primitive_name,
            success = event.success,
            latency_ms = event.latency,
            "Recording event"
        );

        if self.config.enable_request_queuing {
            self.dispatcher.enqueue(event).is_queued()
        } else {
            let delivered = send_once(self.transport.as_ref(), &event, &self.metrics).await;
            if !delivered {
                warn!(primitive = %event.primitive_name, "Failed to deliver event");
            }
            delivered
        }
    }
}

#[async_trait]
impl CallRecorder for Pipeline {
    async fn record(&self, call: CompletedCall, request: Option<RequestContext>) {
        self.record_event(call, request).await;
    }
}
