//! Event relay shared by the dispatcher and SSE streams.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::{Event, EventQueue, EventType, QueueError};

/// How events reach multiple connected clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// One queue; concurrent clients split the events between them
    #[default]
    Shared,
    /// Every client sees every event
    Broadcast,
}

/// Why a subscription produced no event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecvError {
    #[error("no event within the keep-alive interval")]
    Timeout,

    #[error("stream lagged behind, {0} events skipped")]
    Lagged(u64),

    #[error("event hub closed")]
    Closed,
}

#[derive(Debug, Clone)]
enum Relay {
    Shared(Arc<EventQueue>),
    Broadcast(broadcast::Sender<Event>),
}

/// Owned event relay. Cheap to clone; clones share the same events.
#[derive(Debug, Clone)]
pub struct EventHub {
    relay: Relay,
}

impl EventHub {
    pub fn new(mode: DeliveryMode, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let relay = match mode {
            DeliveryMode::Shared => Relay::Shared(Arc::new(EventQueue::new(capacity))),
            DeliveryMode::Broadcast => Relay::Broadcast(broadcast::channel(capacity).0),
        };
        Self { relay }
    }

    pub fn mode(&self) -> DeliveryMode {
        match self.relay {
            Relay::Shared(_) => DeliveryMode::Shared,
            Relay::Broadcast(_) => DeliveryMode::Broadcast,
        }
    }

    /// Build an event stamped now and send it
    pub fn publish(&self, kind: EventType, data: Value) {
        self.send(Event::new(kind, data));
    }

    pub fn send(&self, event: Event) {
        tracing::trace!("Publishing {} event", event.kind);
        match &self.relay {
            Relay::Shared(queue) => queue.enqueue(event),
            Relay::Broadcast(sender) => {
                // No receivers: the event has no audience and is discarded.
                let _ = sender.send(event);
            }
        }
    }

    /// A consumer for one SSE client
    pub fn subscribe(&self) -> Subscription {
        match &self.relay {
            Relay::Shared(queue) => Subscription::Shared(Arc::clone(queue)),
            Relay::Broadcast(sender) => Subscription::Broadcast(sender.subscribe()),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DeliveryMode::default(), crate::config::DEFAULT_EVENT_CAPACITY)
    }
}

/// One client's view of the hub
#[derive(Debug)]
pub enum Subscription {
    Shared(Arc<EventQueue>),
    Broadcast(broadcast::Receiver<Event>),
}

impl Subscription {
    /// Next event, or why there is none within `wait`
    pub async fn recv_timeout(&mut self, wait: Duration) -> Result<Event, RecvError> {
        match self {
            Subscription::Shared(queue) => queue
                .dequeue_timeout(wait)
                .await
                .map_err(|QueueError::Timeout(_)| RecvError::Timeout),
            Subscription::Broadcast(receiver) => {
                match tokio::time::timeout(wait, receiver.recv()).await {
                    Err(_) => Err(RecvError::Timeout),
                    Ok(Ok(event)) => Ok(event),
                    Ok(Err(broadcast::error::RecvError::Lagged(n))) => Err(RecvError::Lagged(n)),
                    Ok(Err(broadcast::error::RecvError::Closed)) => Err(RecvError::Closed),
                }
            }
        }
    }
}
