//! Handler common utility functions

use contracts::{EventKind, PacketValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Number;

use crate::error::{MapError, Result};

/// Radio link quality block shared by electricity and heating payloads
#[derive(Debug, Deserialize)]
pub struct Signal {
    pub rssi: PacketValue,
    pub lqi: PacketValue,
}

/// Decode a payload into its typed shape
///
/// Syntax errors become `InvalidJson`, shape mismatches become `Decode`.
pub fn decode<T: DeserializeOwned>(event: EventKind, payload: &str) -> Result<T> {
    serde_json::from_str(payload).map_err(|source| {
        if source.is_data() {
            MapError::Decode {
                event,
                message: source.to_string(),
            }
        } else {
            MapError::InvalidJson { event, source }
        }
    })
}

/// Exact `a - b`
///
/// Integer inputs stay integers, anything else goes through f64.
pub fn subtract(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.checked_sub(b).map(Number::from);
    }
    Number::from_f64(a.as_f64()? - b.as_f64()?)
}

pub fn is_negative(n: &Number) -> bool {
    n.as_f64().is_some_and(|v| v < 0.0)
}

pub fn is_positive(n: &Number) -> bool {
    n.as_f64().is_some_and(|v| v > 0.0)
}
