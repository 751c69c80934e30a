//! UDP 事件源
//!
//! Each datagram carries one or more newline-separated envelopes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use contracts::DecodedEvent;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::source::{forward, EventSource};

/// Largest datagram accepted
const MAX_DATAGRAM: usize = 64 * 1024;

/// First pause after a failed receive
const RECV_BACKOFF_INITIAL: Duration = Duration::from_millis(50);
/// Longest pause between receive attempts
const RECV_BACKOFF_MAX: Duration = Duration::from_secs(2);
/// Consecutive receive failures before the source stops
const MAX_RECV_FAILURES: u32 = 20;

/// Pause schedule for consecutive receive failures
#[derive(Debug, Clone)]
struct RecvBackoff {
    current_delay: Duration,
    failure_count: u32,
}

impl RecvBackoff {
    fn new() -> Self {
        Self {
            current_delay: RECV_BACKOFF_INITIAL,
            failure_count: 0,
        }
    }

    /// Delay before the next attempt, or None once the failure limit is hit
    fn on_failure(&mut self) -> Option<Duration> {
        self.failure_count += 1;
        if self.failure_count >= MAX_RECV_FAILURES {
            return None;
        }
        let delay = self.current_delay;
        self.current_delay = (self.current_delay * 2).min(RECV_BACKOFF_MAX);
        Some(delay)
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Listens for envelopes on a UDP socket until stopped
pub struct UdpSource {
    name: String,
    socket: UdpSocket,
}

impl UdpSource {
    /// Bind the listening socket
    pub async fn bind(addr: &str) -> Result<Self> {
        let name = format!("udp://{addr}");
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|error| IngestionError::SourceOpen {
                source_name: name.clone(),
                error,
            })?;
        Ok(Self { name, socket })
    }

    /// Bound address (useful when binding port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    #[instrument(name = "udp_source_run", skip_all, fields(source = %self.name))]
    async fn run(self, tx: Sender<DecodedEvent>, metrics: Arc<IngestionMetrics>) {
        info!(source = %self.name, addr = ?self.local_addr(), "listening for events");
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let mut backoff = RecvBackoff::new();

        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => {
                    backoff.reset();
                    received
                }
                Err(e) => match backoff.on_failure() {
                    Some(delay) => {
                        warn!(source = %self.name, error = %e, ?delay, "receive failed");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => {
                        error!(
                            source = %self.name,
                            error = %e,
                            failures = MAX_RECV_FAILURES,
                            "receive keeps failing, stopping source"
                        );
                        break;
                    }
                },
            };

            let Ok(text) = std::str::from_utf8(&buf[..len]) else {
                metrics.record_parse_error();
                warn!(source = %self.name, %peer, "datagram is not UTF-8");
                continue;
            };

            debug!(source = %self.name, %peer, bytes = len, "datagram received");
            if !forward(&self.name, text, &tx, &metrics).await {
                break;
            }
        }
    }
}

impl EventSource for UdpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(
        self: Box<Self>,
        tx: Sender<DecodedEvent>,
        metrics: Arc<IngestionMetrics>,
    ) -> JoinHandle<()> {
        tokio::spawn((*self).run(tx, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::bounded;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_udp_datagrams() {
        let source = UdpSource::bind("127.0.0.1:0").await.unwrap();
        let addr = source.local_addr().unwrap();

        let (tx, rx) = bounded(10);
        let metrics = Arc::new(IngestionMetrics::new());
        let handle = Box::new(source).spawn(tx, Arc::clone(&metrics));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender
            .send_to(
                b"{\"event\": \"solar\", \"payload\": {\"current\": []}}\n{\"event\": \"weather\", \"payload\": {}}",
                addr,
            )
            .await
            .unwrap();
        sender.send_to(b"\xff\xfe", addr).await.unwrap();

        let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.name, "solar");
        assert_eq!(first.payload, r#"{"current":[]}"#);
        assert_eq!(second.name, "weather");

        handle.abort();
        assert_eq!(metrics.snapshot().events_received, 2);
    }

    #[test]
    fn test_recv_backoff_grows_then_gives_up() {
        let mut backoff = RecvBackoff::new();
        let delays: Vec<Duration> = std::iter::from_fn(|| backoff.on_failure()).collect();

        assert_eq!(delays.len() as u32, MAX_RECV_FAILURES - 1);
        assert_eq!(delays[0], RECV_BACKOFF_INITIAL);
        assert_eq!(delays[1], RECV_BACKOFF_INITIAL * 2);
        assert!(delays.iter().all(|d| !d.is_zero() && *d <= RECV_BACKOFF_MAX));
        assert_eq!(delays.last(), Some(&RECV_BACKOFF_MAX));
        assert!(backoff.on_failure().is_none());

        backoff.reset();
        assert_eq!(backoff.on_failure(), Some(RECV_BACKOFF_INITIAL));
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let err = UdpSource::bind("127.0.0.1").await.err().unwrap();
        assert!(matches!(err, IngestionError::SourceOpen { .. }));
    }
}
