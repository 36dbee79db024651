//! Windowed delivery: size- or time-triggered batches, per-event retry.

use std::sync::Arc;
use std::time::Duration;

use agnost_core::CollectorTransport;
use agnost_domain::EventPayload;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::metrics::DeliveryMetrics;
use super::queue::EventQueue;
use super::{send_once, DeliveryWorkerConfig};

const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

pub(super) async fn run(
    queue: Arc<EventQueue>,
    transport: Arc<dyn CollectorTransport>,
    metrics: Arc<DeliveryMetrics>,
    config: DeliveryWorkerConfig,
    cancel: CancellationToken,
) {
    // interval_at panics on a zero period
    let period = config.flush_interval.max(MIN_FLUSH_INTERVAL);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Batched delivery loop cancelled");
                break;
            }
            () = queue.notified() => {
                let flush_requested = queue.take_flush_request();
                if flush_requested || queue.len() >= config.batch_size {
                    flush(&queue, transport.as_ref(), &metrics, &config, &cancel).await;
                }
            }
            _ = ticker.tick() => {
                flush(&queue, transport.as_ref(), &metrics, &config, &cancel).await;
            }
        }
    }
}

/// Deliver everything queued, `batch_size` events at a time.
async fn flush(
    queue: &EventQueue,
    transport: &dyn CollectorTransport,
    metrics: &DeliveryMetrics,
    config: &DeliveryWorkerConfig,
    cancel: &CancellationToken,
) {
    loop {
        let batch = queue.take(config.batch_size);
        if batch.is_empty() {
            return;
        }

        metrics.record_batch();
        debug!(count = batch.len(), "Flushing event batch");

        let mut events = batch.into_iter();
        while let Some(event) = events.next() {
            if cancel.is_cancelled() {
                let mut unsent = vec![event];
                unsent.extend(events);
                debug!(count = unsent.len(), "Delivery cancelled; returning events to queue");
                queue.restore(unsent);
                return;
            }

            deliver_with_retry(transport, &event, metrics, config, cancel).await;
            queue.complete();
        }
    }
}

/// Up to `max_attempts` attempts spaced by `retry_delay`. Exhausted events are
/// dropped with a warning.
async fn deliver_with_retry(
    transport: &dyn CollectorTransport,
    event: &EventPayload,
    metrics: &DeliveryMetrics,
    config: &DeliveryWorkerConfig,
    cancel: &CancellationToken,
) {
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if send_once(transport, event, metrics).await {
            return;
        }
        if attempt == max_attempts {
            break;
        }

        debug!(
            primitive = %event.primitive_name,
            attempt,
            max_attempts,
            "Retrying event delivery"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(config.retry_delay) => {}
        }
    }

    metrics.record_dropped_failed();
    warn!(
        primitive = %event.primitive_name,
        session_id = %event.session_id,
        max_attempts,
        "Dropping event after failed delivery attempts"
    );
}
