//! Bounded ingress queue shared by the producer side and a delivery worker.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use agnost_core::EnqueueOutcome;
use agnost_domain::EventPayload;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// FIFO of events waiting for delivery.
///
/// Events leave the queue in two steps: `take`/`pop` moves them in flight,
/// `complete` retires them. `pending` counts both, so a flush can wait for
/// work the worker has already picked up.
#[derive(Debug)]
pub(crate) struct EventQueue {
    events: Mutex<VecDeque<EventPayload>>,
    capacity: usize,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    flush_requested: AtomicBool,
    notify: Notify,
}

impl EventQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            flush_requested: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Append an event, shedding it when the queue is full or closed.
    pub(crate) fn push(&self, event: EventPayload) -> EnqueueOutcome {
        if self.closed.load(Ordering::SeqCst) {
            return EnqueueOutcome::DroppedClosed;
        }

        {
            let mut events = self.events.lock();
            if events.len() >= self.capacity {
                return EnqueueOutcome::DroppedFull;
            }
            events.push_back(event);
        }

        self.notify.notify_one();
        EnqueueOutcome::Queued
    }

    /// Next event, moved in flight.
    pub(crate) fn pop(&self) -> Option<EventPayload> {
        let mut events = self.events.lock();
        let event = events.pop_front()?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Some(event)
    }

    /// Up to `max` events, moved in flight.
    pub(crate) fn take(&self, max: usize) -> Vec<EventPayload> {
        let mut events = self.events.lock();
        let count = max.min(events.len());
        self.in_flight.fetch_add(count, Ordering::SeqCst);
        events.drain(..count).collect()
    }

    /// Put in-flight events back at the head of the queue, in order.
    pub(crate) fn restore(&self, unsent: Vec<EventPayload>) {
        let count = unsent.len();
        let mut events = self.events.lock();
        for event in unsent.into_iter().rev() {
            events.push_front(event);
        }
        self.in_flight.fetch_sub(count, Ordering::SeqCst);
    }

    /// Retire one in-flight event, delivered or dropped.
    pub(crate) fn complete(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Events waiting in the queue, excluding in-flight ones.
    pub(crate) fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Events waiting or in flight.
    pub(crate) fn pending(&self) -> usize {
        let events = self.events.lock();
        events.len() + self.in_flight.load(Ordering::SeqCst)
    }

    /// Discard queued events; in-flight ones are unaffected.
    pub(crate) fn clear(&self) -> usize {
        let mut events = self.events.lock();
        let discarded = events.len();
        events.clear();
        discarded
    }

    pub(crate) fn set_closed(&self, closed: bool) {
        self.closed.store(closed, Ordering::SeqCst);
    }

    /// Ask the worker to deliver everything queued now.
    pub(crate) fn request_flush(&self) {
        self.flush_requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub(crate) fn take_flush_request(&self) -> bool {
        self.flush_requested.swap(false, Ordering::SeqCst)
    }

    /// Wait for a push or a flush request.
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}
