//! Delivery counters
//!
//! Lock-free counters updated by the delivery workers and the synchronous
//! delivery path. Read them through [`DeliveryMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one delivery pipeline.
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Events accepted into the queue
    pub enqueued: AtomicU64,
    /// Events the collector acknowledged
    pub delivered: AtomicU64,
    /// Events shed because the queue was full or closed
    pub dropped_overflow: AtomicU64,
    /// Events abandoned after their last failed attempt
    pub dropped_failed: AtomicU64,
    /// HTTP attempts, including retries
    pub attempts: AtomicU64,
    pub batches_flushed: AtomicU64,
}

/// Point-in-time copy of [`DeliveryMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryMetricsSnapshot {
    pub enqueued: u64,
    pub delivered: u64,
    pub dropped_overflow: u64,
    pub dropped_failed: u64,
    pub attempts: u64,
    pub batches_flushed: u64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_overflow(&self) {
        self.dropped_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_failed(&self) {
        self.dropped_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryMetricsSnapshot {
        DeliveryMetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_overflow: self.dropped_overflow.load(Ordering::Relaxed),
            dropped_failed: self.dropped_failed.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
        }
    }
}
