//! Tool-call progress events relayed to SSE clients.
//!
//! - [`Event`]: `{type, data, timestamp}` record, immutable once created
//! - [`EventQueue`]: bounded FIFO with drop-oldest overflow
//! - [`EventHub`]: the owned relay handed to producers and SSE consumers,
//!   either one shared queue or a broadcast fan-out (see [`DeliveryMode`])

mod hub;
mod queue;

pub use hub::{DeliveryMode, EventHub, RecvError, Subscription};
pub use queue::{EventQueue, QueueError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Operations that report progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Download,
    List,
    Read,
    /// Generic call by tool name
    Tool,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Search,
        Operation::Download,
        Operation::List,
        Operation::Read,
        Operation::Tool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Download => "download",
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Tool => "tool",
        }
    }
}

/// Lifecycle phase of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Started,
    Completed,
    Error,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Started, Phase::Completed, Phase::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Started => "started",
            Phase::Completed => "completed",
            Phase::Error => "error",
        }
    }
}

/// Event tag, serialized as `<operation>_<phase>` or `ping`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Lifecycle(Operation, Phase),
    Ping,
}

impl EventType {
    pub fn started(op: Operation) -> Self {
        EventType::Lifecycle(op, Phase::Started)
    }

    pub fn completed(op: Operation) -> Self {
        EventType::Lifecycle(op, Phase::Completed)
    }

    pub fn error(op: Operation) -> Self {
        EventType::Lifecycle(op, Phase::Error)
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            EventType::Lifecycle(_, phase) => Some(*phase),
            EventType::Ping => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Lifecycle(op, phase) => write!(f, "{}_{}", op.as_str(), phase.as_str()),
            EventType::Ping => f.write_str("ping"),
        }
    }
}

/// Error for an unknown event tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type '{0}'")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ping" {
            return Ok(EventType::Ping);
        }
        let unknown = || UnknownEventType(s.to_string());
        let (op, phase) = s.split_once('_').ok_or_else(unknown)?;
        let op = Operation::ALL
            .into_iter()
            .find(|o| o.as_str() == op)
            .ok_or_else(unknown)?;
        let phase = Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == phase)
            .ok_or_else(unknown)?;
        Ok(EventType::Lifecycle(op, phase))
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub data: Map<String, Value>,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

impl Event {
    /// Create an event stamped with the current time. Non-object data is
    /// wrapped as `{"value": data}`.
    pub fn new(kind: EventType, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            kind,
            data,
            timestamp: unix_timestamp(),
        }
    }
}

/// Current wall-clock time in fractional seconds since the Unix epoch
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
