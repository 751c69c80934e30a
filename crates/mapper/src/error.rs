//! Mapper 错误类型

use contracts::EventKind;
use thiserror::Error;

/// Event mapping error
///
/// Aborts processing of the single event that produced it.
#[derive(Debug, Error)]
pub enum MapError {
    /// Payload is not JSON at all
    #[error("{event} payload is not valid JSON: {source}")]
    InvalidJson {
        event: EventKind,
        #[source]
        source: serde_json::Error,
    },

    /// Payload is JSON but lacks the expected shape
    #[error("{event} payload could not be decoded: {message}")]
    Decode { event: EventKind, message: String },
}

impl MapError {
    /// Required field absent
    pub fn missing(event: EventKind, path: impl AsRef<str>) -> Self {
        Self::Decode {
            event,
            message: format!("missing field `{}`", path.as_ref()),
        }
    }

    /// Event kind the failing payload belonged to
    pub fn event(&self) -> EventKind {
        match self {
            Self::InvalidJson { event, .. } | Self::Decode { event, .. } => *event,
        }
    }
}

/// Mapper Result 类型别名
pub type Result<T> = std::result::Result<T, MapError>;
