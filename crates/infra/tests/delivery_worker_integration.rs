//! Integration tests for the delivery worker
//!
//! **Coverage:**
//! - Batched mode: size trigger, time trigger, retry spacing, drop after
//!   exhausting attempts
//! - Sequential mode: FIFO order, no retry
//! - Load shedding, clear, flush and lifecycle
//! - End to end against a WireMock collector

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use agnost_core::{EnqueueOutcome, EventDispatcher};
use agnost_domain::{AnalyticsConfig, DeliveryMode};
use agnost_infra::{CollectorClient, DeliveryMetrics, DeliveryWorker, DeliveryWorkerConfig};
use support::{event, wait_until, RecordingTransport};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn batched(batch_size: usize, flush_interval: Duration) -> DeliveryWorkerConfig {
    DeliveryWorkerConfig {
        mode: DeliveryMode::Batched,
        batch_size,
        flush_interval,
        retry_delay: Duration::from_millis(20),
        ..DeliveryWorkerConfig::default()
    }
}

fn sequential() -> DeliveryWorkerConfig {
    DeliveryWorkerConfig { mode: DeliveryMode::Sequential, ..DeliveryWorkerConfig::default() }
}

fn worker(transport: &Arc<RecordingTransport>, config: DeliveryWorkerConfig) -> DeliveryWorker {
    DeliveryWorker::new(transport.clone(), config, Arc::new(DeliveryMetrics::new()))
}

// ============================================================================
// Batched mode
// ============================================================================

#[tokio::test]
async fn batch_is_sent_when_size_is_reached() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, batched(3, Duration::from_secs(60)));
    worker.start().unwrap();

    for name in ["a", "b"] {
        assert!(worker.enqueue(event(name)).is_queued());
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.attempt_count().await, 0, "partial batch must wait");

    worker.enqueue(event("c"));
    assert!(wait_until(Duration::from_secs(2), || async { transport.delivered.lock().await.len() == 3 }).await);

    assert_eq!(transport.delivered_names().await, ["a", "b", "c"]);
    assert_eq!(worker.metrics().snapshot().batches_flushed, 1);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn partial_batch_is_sent_after_flush_interval() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, batched(5, Duration::from_millis(100)));
    worker.start().unwrap();

    worker.enqueue(event("a"));
    worker.enqueue(event("b"));

    assert!(wait_until(Duration::from_secs(2), || async { transport.delivered.lock().await.len() == 2 }).await);
    assert_eq!(worker.pending(), 0);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn zero_flush_interval_keeps_worker_alive() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, batched(5, Duration::ZERO));
    worker.start().unwrap();

    for name in ["a", "b", "c"] {
        worker.enqueue(event(name));
    }

    assert!(wait_until(Duration::from_secs(2), || async { transport.delivered.lock().await.len() == 3 }).await);
    assert_eq!(worker.pending(), 0);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn failed_event_is_attempted_max_retries_plus_one_times() {
    let transport = Arc::new(RecordingTransport::failing());
    let config = AnalyticsConfig {
        max_retries: 2,
        retry_delay: Duration::from_millis(50),
        batch_size: 1,
        ..AnalyticsConfig::default()
    };
    let worker = worker(&transport, DeliveryWorkerConfig::from(&config));
    worker.start().unwrap();

    worker.enqueue(event("doomed"));
    worker.flush().await;

    let attempts = transport.attempts.lock().await;
    assert_eq!(attempts.len(), 3);
    for pair in attempts.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(50));
    }
    drop(attempts);

    let metrics = worker.metrics().snapshot();
    assert_eq!(metrics.attempts, 3);
    assert_eq!(metrics.dropped_failed, 1);
    assert_eq!(metrics.delivered, 0);
    assert_eq!(worker.pending(), 0);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn transient_failure_is_retried_until_delivered() {
    let transport = Arc::new(RecordingTransport::failing_first(1));
    let worker = worker(&transport, batched(1, Duration::from_secs(60)));
    worker.start().unwrap();

    worker.enqueue(event("flaky"));
    worker.flush().await;

    assert_eq!(transport.attempt_count().await, 2);
    assert_eq!(transport.delivered_names().await, ["flaky"]);
    assert_eq!(worker.metrics().snapshot().dropped_failed, 0);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn flush_drains_queue_without_waiting_for_interval() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, batched(10, Duration::from_secs(60)));
    worker.start().unwrap();

    for name in ["a", "b", "c", "d"] {
        worker.enqueue(event(name));
    }
    worker.flush().await;

    assert_eq!(worker.pending(), 0);
    assert_eq!(transport.delivered_names().await, ["a", "b", "c", "d"]);
    worker.stop().await.unwrap();
}

// ============================================================================
// Sequential mode
// ============================================================================

#[tokio::test]
async fn sequential_mode_delivers_in_fifo_order() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, sequential());
    worker.start().unwrap();

    for name in ["first", "second", "third"] {
        worker.enqueue(event(name));
    }
    worker.flush().await;

    assert_eq!(transport.delivered_names().await, ["first", "second", "third"]);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn sequential_mode_does_not_retry() {
    let transport = Arc::new(RecordingTransport::failing());
    let worker = worker(&transport, sequential());
    worker.start().unwrap();

    worker.enqueue(event("a"));
    worker.enqueue(event("b"));
    worker.flush().await;

    assert_eq!(transport.attempt_count().await, 2);
    assert_eq!(worker.metrics().snapshot().dropped_failed, 2);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn sequential_mode_spaces_dispatches() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(
        &transport,
        DeliveryWorkerConfig { dispatch_delay: Duration::from_millis(30), ..sequential() },
    );
    worker.start().unwrap();

    worker.enqueue(event("a"));
    worker.enqueue(event("b"));
    worker.flush().await;

    let attempts = transport.attempts.lock().await;
    assert_eq!(attempts.len(), 2);
    assert!(attempts[1].0 - attempts[0].0 >= Duration::from_millis(30));
    drop(attempts);
    worker.stop().await.unwrap();
}

// ============================================================================
// Backpressure, clear, lifecycle
// ============================================================================

#[tokio::test]
async fn full_queue_sheds_new_events() {
    let transport = Arc::new(RecordingTransport::new());
    let worker =
        worker(&transport, DeliveryWorkerConfig { queue_capacity: 2, ..DeliveryWorkerConfig::default() });

    assert_eq!(worker.enqueue(event("a")), EnqueueOutcome::Queued);
    assert_eq!(worker.enqueue(event("b")), EnqueueOutcome::Queued);
    assert_eq!(worker.enqueue(event("c")), EnqueueOutcome::DroppedFull);

    let metrics = worker.metrics().snapshot();
    assert_eq!(metrics.enqueued, 2);
    assert_eq!(metrics.dropped_overflow, 1);
    assert_eq!(worker.pending(), 2);
}

#[tokio::test]
async fn clear_discards_without_delivery() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, batched(10, Duration::from_secs(60)));

    for name in ["a", "b", "c"] {
        worker.enqueue(event(name));
    }
    assert_eq!(worker.clear(), 3);
    assert_eq!(worker.pending(), 0);

    worker.start().unwrap();
    worker.flush().await;
    assert_eq!(transport.attempt_count().await, 0);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn lifecycle_rejects_double_start_and_closes_queue_on_stop() {
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, batched(5, Duration::from_secs(60)));

    assert!(worker.stop().await.is_err(), "stop before start must fail");
    worker.start().unwrap();
    assert!(worker.is_running());
    assert!(worker.start().is_err());

    worker.stop().await.unwrap();
    assert!(!worker.is_running());
    assert_eq!(worker.enqueue(event("late")), EnqueueOutcome::DroppedClosed);

    worker.start().unwrap();
    assert!(worker.enqueue(event("again")).is_queued());
    worker.flush().await;
    assert_eq!(transport.delivered_names().await, ["again"]);
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn flush_budget_bounds_the_wait() {
    let config = DeliveryWorkerConfig {
        request_timeout: Duration::from_millis(100),
        retry_delay: Duration::from_millis(50),
        max_attempts: 2,
        ..DeliveryWorkerConfig::default()
    };
    assert!(config.flush_budget(2) >= Duration::from_millis(600));

    // Not started: nothing will drain, flush must return immediately.
    let transport = Arc::new(RecordingTransport::new());
    let worker = worker(&transport, config);
    worker.enqueue(event("stuck"));
    tokio::time::timeout(Duration::from_millis(200), worker.flush()).await.unwrap();
    assert_eq!(worker.pending(), 1);
}

// ============================================================================
// End to end with the HTTP collector
// ============================================================================

#[tokio::test]
async fn delivers_through_collector_client_with_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/capture-event"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/capture-event"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = AnalyticsConfig {
        endpoint: server.uri(),
        batch_size: 1,
        max_retries: 3,
        retry_delay: Duration::from_millis(20),
        ..AnalyticsConfig::default()
    };
    let client = Arc::new(CollectorClient::new("org-1", &config).unwrap());
    let worker = DeliveryWorker::new(
        client,
        DeliveryWorkerConfig::from(&config),
        Arc::new(DeliveryMetrics::new()),
    );
    worker.start().unwrap();

    worker.enqueue(event("echo"));
    worker.flush().await;

    let metrics = worker.metrics().snapshot();
    assert_eq!(metrics.attempts, 3);
    assert_eq!(metrics.delivered, 1);
    worker.stop().await.unwrap();
}
