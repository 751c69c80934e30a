//! Input selection and ingestion metrics

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::IngestionError;

/// Where decoded gateway events come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    /// JSON lines on standard input
    Stdin,
    /// JSON lines from a file
    File(PathBuf),
    /// One or more JSON lines per UDP datagram, bound on `host:port`
    Udp(String),
}

impl FromStr for InputSpec {
    type Err = IngestionError;

    /// `stdin` / `-`, `udp://host:port`, anything else is a file path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IngestionError::invalid_input(s, "empty input"));
        }
        if s == "-" || s.eq_ignore_ascii_case("stdin") {
            return Ok(Self::Stdin);
        }
        if let Some(addr) = s.strip_prefix("udp://") {
            return match addr.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    Ok(Self::Udp(addr.to_string()))
                }
                _ => Err(IngestionError::invalid_input(s, "expected udp://host:port")),
            };
        }
        Ok(Self::File(PathBuf::from(s)))
    }
}

impl fmt::Display for InputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Udp(addr) => write!(f, "udp://{addr}"),
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total envelopes accepted
    pub events_received: AtomicU64,

    /// Envelopes that failed to parse
    pub parse_errors: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record event received
    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub parse_errors: u64,
    pub queue_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_spec() {
        assert_eq!("stdin".parse::<InputSpec>().unwrap(), InputSpec::Stdin);
        assert_eq!("-".parse::<InputSpec>().unwrap(), InputSpec::Stdin);
        assert_eq!(
            "udp://0.0.0.0:5100".parse::<InputSpec>().unwrap(),
            InputSpec::Udp("0.0.0.0:5100".into())
        );
        assert_eq!(
            "events.jsonl".parse::<InputSpec>().unwrap(),
            InputSpec::File(PathBuf::from("events.jsonl"))
        );
    }

    #[test]
    fn test_bad_udp_spec() {
        for raw in ["udp://", "udp://host", "udp://:5100", "udp://host:99999", ""] {
            assert!(raw.parse::<InputSpec>().is_err(), "accepted: {raw}");
        }
    }

    #[test]
    fn test_display_round_trip() {
        let spec: InputSpec = "udp://127.0.0.1:5100".parse().unwrap();
        assert_eq!(spec.to_string(), "udp://127.0.0.1:5100");
    }
}
