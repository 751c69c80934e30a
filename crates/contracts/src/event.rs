//! DecodedEvent - Decoder output
//!
//! Named events emitted by the gateway decoder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Telemetry category reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Whole-house CT clamp readings
    Electricity,
    /// PV generation / export readings
    Solar,
    /// Heating controller status
    Heating,
    /// Internet weather info, never relayed
    Weather,
}

impl EventKind {
    /// Every kind, in handler registration order
    pub const ALL: [EventKind; 4] = [
        EventKind::Electricity,
        EventKind::Solar,
        EventKind::Heating,
        EventKind::Weather,
    ];

    /// Event name as emitted by the decoder
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Solar => "solar",
            Self::Heating => "heating",
            Self::Weather => "weather",
        }
    }

    /// Resolve a decoder event name, `None` for names the relay does not know
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded event
///
/// Ephemeral: produced by the decoder, consumed once by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// Event name (e.g. "electricity"), may be unknown to the relay
    pub name: String,

    /// JSON-encoded payload
    pub payload: String,
}

impl DecodedEvent {
    /// Create a new event
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Known kind of this event, if any
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_name(&self.name)
    }
}
