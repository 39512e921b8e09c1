//! Server-Sent Events stream.
//!
//! Each connected client gets its own consumer loop: wait for the next
//! event up to the keep-alive interval, then emit either the event or a
//! ping. The loop only ends when the client goes away (the stream is
//! dropped) or the hub closes.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, Sse};
use futures_util::stream::{Stream, StreamExt};
use serde_json::json;

use super::AppState;
use crate::events::{unix_timestamp, RecvError, Subscription};

fn ping_frame() -> String {
    json!({ "type": "ping", "timestamp": unix_timestamp() }).to_string()
}

fn error_frame(message: &str) -> String {
    json!({ "type": "error", "message": message }).to_string()
}

/// JSON frames for one client
pub fn frames(mut subscription: Subscription, keep_alive: Duration) -> impl Stream<Item = String> {
    async_stream::stream! {
        loop {
            match subscription.recv_timeout(keep_alive).await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(frame) => yield frame,
                    Err(e) => {
                        tracing::error!("Failed to serialize {} event: {}", event.kind, e);
                        yield error_frame(&e.to_string());
                    }
                },
                Err(RecvError::Timeout) => yield ping_frame(),
                Err(e @ RecvError::Lagged(_)) => {
                    tracing::warn!("SSE client {}", e);
                    yield error_frame(&e.to_string());
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Event hub closed, ending SSE stream");
                    break;
                }
            }
        }
    }
}

/// `GET /events`
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    tracing::info!("New SSE connection ({:?} delivery)", state.hub.mode());

    let stream = frames(state.hub.subscribe(), state.settings.events.keep_alive())
        .map(|frame| Ok(SseEvent::default().data(frame)));

    Sse::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DeliveryMode, EventHub, EventType, Operation};
    use serde_json::Value;
    use tokio::time::Instant;

    fn parse(frame: &str) -> Value {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_stream_pings_once_per_interval() {
        let hub = EventHub::new(DeliveryMode::Shared, 8);
        let stream = frames(hub.subscribe(), Duration::from_secs(30));
        futures_util::pin_mut!(stream);

        let started = Instant::now();
        for n in 1..=3u64 {
            let frame = parse(&stream.next().await.unwrap());
            assert_eq!(frame["type"], "ping");
            assert!(frame["timestamp"].is_number());
            assert_eq!(frame.as_object().unwrap().len(), 2);
            let elapsed = started.elapsed();
            assert!(elapsed >= Duration::from_secs(30 * n));
            assert!(elapsed < Duration::from_secs(30 * n + 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_preempts_ping() {
        let hub = EventHub::new(DeliveryMode::Shared, 8);
        let stream = frames(hub.subscribe(), Duration::from_secs(30));
        futures_util::pin_mut!(stream);

        hub.publish(
            EventType::started(Operation::Download),
            json!({"paper_id": "2301.12345"}),
        );
        let started = Instant::now();
        let frame = parse(&stream.next().await.unwrap());
        assert_eq!(frame["type"], "download_started");
        assert_eq!(frame["data"]["paper_id"], "2301.12345");
        assert!(started.elapsed() < Duration::from_secs(1));

        let frame = parse(&stream.next().await.unwrap());
        assert_eq!(frame["type"], "ping");
    }

    #[tokio::test]
    async fn test_lag_becomes_error_frame() {
        let hub = EventHub::new(DeliveryMode::Broadcast, 1);
        let stream = frames(hub.subscribe(), Duration::from_secs(30));
        futures_util::pin_mut!(stream);

        hub.publish(EventType::started(Operation::List), json!({}));
        hub.publish(EventType::completed(Operation::List), json!({}));

        let frame = parse(&stream.next().await.unwrap());
        assert_eq!(frame["type"], "error");
        assert!(frame["message"].as_str().unwrap().contains("lagged"));

        let frame = parse(&stream.next().await.unwrap());
        assert_eq!(frame["type"], "list_completed");
    }

    #[test]
    fn test_error_frame_escapes_message() {
        let frame = parse(&error_frame("bad \"quote\""));
        assert_eq!(frame["message"], "bad \"quote\"");
    }
}
