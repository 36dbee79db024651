//! Sequential delivery: one event at a time, one attempt each.

use std::sync::Arc;
use std::time::Duration;

use agnost_core::CollectorTransport;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::metrics::DeliveryMetrics;
use super::queue::EventQueue;
use super::send_once;

pub(super) async fn run(
    queue: Arc<EventQueue>,
    transport: Arc<dyn CollectorTransport>,
    metrics: Arc<DeliveryMetrics>,
    dispatch_delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        let event = match queue.pop() {
            Some(event) => event,
            None => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!("Sequential delivery loop cancelled");
                        break;
                    }
                    () = queue.notified() => {}
                }
                continue;
            }
        };

        if !send_once(transport.as_ref(), &event, &metrics).await {
            metrics.record_dropped_failed();
            warn!(
                primitive = %event.primitive_name,
                session_id = %event.session_id,
                "Dropping event after failed delivery"
            );
        }
        queue.complete();

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Sequential delivery loop cancelled");
                break;
            }
            () = tokio::time::sleep(dispatch_delay) => {}
        }
    }
}
