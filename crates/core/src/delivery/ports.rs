//! Port interfaces for event delivery

use agnost_domain::{EventPayload, Result, SessionPayload};
use async_trait::async_trait;

/// Stateless client of the collector's two endpoints.
///
/// One call is one attempt; retry policy belongs to the dispatcher.
#[async_trait]
pub trait CollectorTransport: Send + Sync {
    /// `POST /api/v1/capture-session`
    async fn create_session(&self, payload: &SessionPayload) -> Result<()>;

    /// `POST /api/v1/capture-event`
    async fn record_event(&self, payload: &EventPayload) -> Result<()>;
}

/// Result of handing an event to a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Ingress at capacity; the event was shed.
    DroppedFull,
    /// The dispatcher has been stopped.
    DroppedClosed,
}

impl EnqueueOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

/// Background delivery queue.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Spawn the delivery worker.
    ///
    /// # Errors
    /// Fails when the worker is already running.
    fn start(&self) -> Result<()>;

    /// Cancel the worker and wait for it to finish. Queued events are kept;
    /// call `flush` first to deliver them.
    ///
    /// # Errors
    /// Fails when the worker is not running or does not stop in time.
    async fn stop(&self) -> Result<()>;

    /// Queue an event. Never waits on network I/O.
    fn enqueue(&self, event: EventPayload) -> EnqueueOutcome;

    /// Dispatch everything currently queued and wait until it is done.
    async fn flush(&self);

    /// Discard pending events without delivering them. Returns how many were
    /// discarded.
    fn clear(&self) -> usize;

    /// Events waiting or in flight.
    fn pending(&self) -> usize;
}
