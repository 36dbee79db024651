use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agnost_core::CollectorTransport;
use agnost_domain::{AgnostError, EventPayload, PrimitiveType, Result, SessionPayload};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Collector double that records every attempt and fails on demand.
#[derive(Default)]
pub struct RecordingTransport {
    /// Every `record_event` attempt with its timestamp, failed ones included.
    pub attempts: Mutex<Vec<(Instant, EventPayload)>>,
    pub delivered: Mutex<Vec<EventPayload>>,
    pub sessions: Mutex<Vec<SessionPayload>>,
    failures_remaining: AtomicUsize,
    always_fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every delivery.
    pub fn failing() -> Self {
        Self { always_fail: true, ..Self::default() }
    }

    /// Fails the first `count` deliveries, then succeeds.
    pub fn failing_first(count: usize) -> Self {
        Self { failures_remaining: AtomicUsize::new(count), ..Self::default() }
    }

    pub async fn delivered_names(&self) -> Vec<String> {
        self.delivered.lock().await.iter().map(|e| e.primitive_name.clone()).collect()
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

#[async_trait]
impl CollectorTransport for RecordingTransport {
    async fn create_session(&self, payload: &SessionPayload) -> Result<()> {
        self.sessions.lock().await.push(payload.clone());
        Ok(())
    }

    async fn record_event(&self, payload: &EventPayload) -> Result<()> {
        self.attempts.lock().await.push((Instant::now(), payload.clone()));

        let scripted_failure = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if self.always_fail || scripted_failure {
            return Err(AgnostError::Delivery("collector returned status 503".into()));
        }

        self.delivered.lock().await.push(payload.clone());
        Ok(())
    }
}

pub fn event(name: &str) -> EventPayload {
    EventPayload {
        org_id: "org-test".into(),
        session_id: "session-test".into(),
        primitive_type: PrimitiveType::Tool,
        primitive_name: name.into(),
        latency: 5,
        success: true,
        args: None,
        result: None,
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
