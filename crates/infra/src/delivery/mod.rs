//! Event delivery pipeline
//!
//! A bounded queue drained by one background worker, in one of two
//! disciplines:
//! - **Sequential**: one event at a time with a short fixed pause between
//!   dispatches; a failed delivery is logged and discarded.
//! - **Batched**: events are delivered when `batch_size` are waiting or every
//!   `flush_interval`, whichever comes first; each event gets up to
//!   `max_attempts` attempts spaced by `retry_delay`.
//!
//! The worker follows the usual lifecycle rules: the join handle is tracked,
//! cancellation is explicit and `stop` waits with a timeout.

mod batched;
mod metrics;
mod queue;
mod sequential;

use std::sync::Arc;
use std::time::Duration;

use agnost_core::{CollectorTransport, EnqueueOutcome, EventDispatcher};
use agnost_domain::constants::{FLUSH_POLL_INTERVAL_MS, SEQUENTIAL_DISPATCH_DELAY_MS};
use agnost_domain::{AgnostError, AnalyticsConfig, DeliveryMode, EventPayload, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub use metrics::{DeliveryMetrics, DeliveryMetricsSnapshot};
use queue::EventQueue;

/// Configuration for the delivery worker.
#[derive(Debug, Clone)]
pub struct DeliveryWorkerConfig {
    pub mode: DeliveryMode,
    /// Events per batch and size trigger for an early flush (batched mode)
    pub batch_size: usize,
    /// Attempts per event, first try included (batched mode)
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Upper bound of one collector request, used to size the flush budget
    pub request_timeout: Duration,
    pub flush_interval: Duration,
    pub queue_capacity: usize,
    /// Pause between dispatches (sequential mode)
    pub dispatch_delay: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for DeliveryWorkerConfig {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for DeliveryWorkerConfig {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            mode: config.delivery_mode,
            batch_size: config.batch_size.max(1),
            max_attempts: config.max_attempts(),
            retry_delay: config.retry_delay,
            request_timeout: config.request_timeout,
            flush_interval: config.flush_interval,
            queue_capacity: config.queue_capacity,
            dispatch_delay: Duration::from_millis(SEQUENTIAL_DISPATCH_DELAY_MS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl DeliveryWorkerConfig {
    /// Longest a flush waits for `pending` events before giving up.
    pub fn flush_budget(&self, pending: usize) -> Duration {
        let per_event = match self.mode {
            DeliveryMode::Sequential => self.request_timeout + self.dispatch_delay,
            DeliveryMode::Batched => {
                (self.request_timeout + self.retry_delay).saturating_mul(self.max_attempts.max(1))
            }
        };
        let count = u32::try_from(pending).unwrap_or(u32::MAX);
        per_event.saturating_mul(count) + Duration::from_millis(FLUSH_POLL_INTERVAL_MS)
    }
}

/// Background delivery worker with explicit lifecycle management.
pub struct DeliveryWorker {
    transport: Arc<dyn CollectorTransport>,
    config: DeliveryWorkerConfig,
    queue: Arc<EventQueue>,
    metrics: Arc<DeliveryMetrics>,
    cancellation: Mutex<CancellationToken>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryWorker {
    pub fn new(
        transport: Arc<dyn CollectorTransport>,
        config: DeliveryWorkerConfig,
        metrics: Arc<DeliveryMetrics>,
    ) -> Self {
        Self {
            transport,
            queue: Arc::new(EventQueue::new(config.queue_capacity)),
            config,
            metrics,
            cancellation: Mutex::new(CancellationToken::new()),
            task_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DeliveryWorkerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    /// Returns true when a worker task is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.lock().is_some()
    }

    fn spawn_loop(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let transport = Arc::clone(&self.transport);
        let metrics = Arc::clone(&self.metrics);

        match self.config.mode {
            DeliveryMode::Sequential => {
                let delay = self.config.dispatch_delay;
                tokio::spawn(sequential::run(queue, transport, metrics, delay, cancel))
            }
            DeliveryMode::Batched => {
                let config = self.config.clone();
                tokio::spawn(batched::run(queue, transport, metrics, config, cancel))
            }
        }
    }
}

#[async_trait]
impl EventDispatcher for DeliveryWorker {
    #[instrument(skip(self), fields(mode = %self.config.mode))]
    fn start(&self) -> Result<()> {
        let mut task_handle = self.task_handle.lock();
        if task_handle.is_some() {
            return Err(AgnostError::Internal("Delivery worker already running".into()));
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(AgnostError::Internal(
                "Delivery worker requires a Tokio runtime".into(),
            ));
        }

        let cancel = CancellationToken::new();
        *self.cancellation.lock() = cancel.clone();
        self.queue.set_closed(false);
        *task_handle = Some(self.spawn_loop(cancel));

        info!(
            batch_size = self.config.batch_size,
            max_attempts = self.config.max_attempts,
            capacity = self.config.queue_capacity,
            "Delivery worker started"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<()> {
        let Some(handle) = self.task_handle.lock().take() else {
            return Err(AgnostError::Internal("Delivery worker not running".into()));
        };

        self.queue.set_closed(true);
        self.cancellation.lock().cancel();

        match tokio::time::timeout(self.config.join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "Delivery worker task panicked");
                return Err(AgnostError::Internal("Delivery worker task panicked".into()));
            }
            Err(_) => {
                warn!("Delivery worker did not complete within timeout");
                return Err(AgnostError::Internal("Delivery worker stop timed out".into()));
            }
        }

        info!(pending = self.queue.pending(), "Delivery worker stopped");
        Ok(())
    }

    fn enqueue(&self, event: EventPayload) -> EnqueueOutcome {
        let outcome = self.queue.push(event);
        match outcome {
            EnqueueOutcome::Queued => self.metrics.record_enqueued(),
            EnqueueOutcome::DroppedFull => {
                self.metrics.record_dropped_overflow();
                warn!(capacity = self.config.queue_capacity, "Event queue full; dropping event");
            }
            EnqueueOutcome::DroppedClosed => {
                self.metrics.record_dropped_overflow();
                debug!("Delivery worker stopped; dropping event");
            }
        }
        outcome
    }

    async fn flush(&self) {
        let pending = self.queue.pending();
        if pending == 0 {
            return;
        }
        if !self.is_running() {
            debug!(pending, "Delivery worker not running; flush skipped");
            return;
        }

        let budget = self.config.flush_budget(pending);
        debug!(pending, budget_ms = budget.as_millis(), "Flushing delivery queue");
        self.queue.request_flush();

        let deadline = Instant::now() + budget;
        let poll = Duration::from_millis(FLUSH_POLL_INTERVAL_MS);
        loop {
            let remaining = self.queue.pending();
            if remaining == 0 {
                debug!("Delivery queue drained");
                return;
            }
            if Instant::now() >= deadline {
                warn!(remaining, "Flush budget exhausted with events still pending");
                return;
            }
            tokio::time::sleep(poll).await;
        }
    }

    fn clear(&self) -> usize {
        let discarded = self.queue.clear();
        if discarded > 0 {
            debug!(discarded, "Discarded pending events");
        }
        discarded
    }

    fn pending(&self) -> usize {
        self.queue.pending()
    }
}

impl Drop for DeliveryWorker {
    fn drop(&mut self) {
        self.cancellation.get_mut().cancel();
    }
}

/// One delivery attempt. Failures are logged, never returned.
pub async fn send_once(
    transport: &dyn CollectorTransport,
    event: &EventPayload,
    metrics: &DeliveryMetrics,
) -> bool {
    metrics.record_attempt();
    match transport.record_event(event).await {
        Ok(()) => {
            metrics.record_delivered();
            true
        }
        Err(err) => {
            debug!(primitive = %event.primitive_name, error = %err, "Event delivery failed");
            false
        }
    }
}
