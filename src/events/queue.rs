//! Bounded multi-producer / multi-consumer event queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::Event;

/// Errors from waiting on the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("no event arrived within {0:?}")]
    Timeout(Duration),
}

/// FIFO of events. `enqueue` never blocks: when the queue is full the
/// oldest event is evicted and counted.
#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event to the tail and wake one waiting consumer
    pub fn enqueue(&self, event: Event) {
        let evicted = {
            let mut events = self.lock();
            let evicted = if events.len() >= self.capacity {
                events.pop_front()
            } else {
                None
            };
            events.push_back(event);
            evicted
        };

        if let Some(old) = evicted {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                "Event queue full ({}), dropped oldest {} event ({} dropped so far)",
                self.capacity,
                old.kind,
                total
            );
        }
        self.notify.notify_one();
    }

    /// Remove the head without waiting
    pub fn try_dequeue(&self) -> Option<Event> {
        self.lock().pop_front()
    }

    /// Remove the head, waiting up to `wait` for one to arrive
    pub async fn dequeue_timeout(&self, wait: Duration) -> Result<Event, QueueError> {
        let deadline = Instant::now() + wait;
        loop {
            // Register interest before checking, so an enqueue between the
            // check and the await is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(event) = self.try_dequeue() {
                return Ok(event);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(QueueError::Timeout(wait));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events evicted by overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_CAPACITY)
    }
}
