//! 事件信封解析
//!
//! The gateway decoder writes one envelope per line (or per datagram):
//! `{"event": "<name>", "payload": <string | object>}`.

use contracts::DecodedEvent;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{IngestionError, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    payload: Value,
}

/// Parse one envelope into a [`DecodedEvent`]
///
/// A string payload is passed through untouched; any other JSON value is
/// re-serialized, so handlers always receive JSON text.
pub fn parse_envelope(raw: &str) -> Result<DecodedEvent> {
    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|e| IngestionError::malformed(e.to_string()))?;

    if envelope.event.trim().is_empty() {
        return Err(IngestionError::malformed("empty event name"));
    }

    let payload = match envelope.payload {
        Value::String(text) => text,
        Value::Null => return Err(IngestionError::malformed("null payload")),
        other => other.to_string(),
    };

    Ok(DecodedEvent::new(envelope.event, payload))
}

/// Parse every non-blank line of a buffer
///
/// Datagrams may carry several envelopes separated by newlines.
pub fn parse_envelopes(raw: &str) -> impl Iterator<Item = Result<DecodedEvent>> + '_ {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_envelope)
}
