//! LogSink - logs packets via tracing instead of sending them
//!
//! Used for `--no-send` runs.

use contracts::{ContractError, FeedSink, RelayedPacket};
use tracing::{info, instrument};

/// Sink that logs what would have been delivered
pub struct LogSink {
    name: String,
    endpoint: String,
}

impl LogSink {
    /// Create a new LogSink standing in for the given endpoint
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl FeedSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, relayed),
        fields(feed = %self.name, seq = relayed.seq)
    )]
    async fn deliver(&self, relayed: &RelayedPacket) -> Result<(), ContractError> {
        let json = relayed.packet.to_json()?;
        info!(
            feed = %self.name,
            endpoint = %self.endpoint,
            node = %relayed.node,
            fields = relayed.packet.len(),
            packet = %json,
            "Packet (not sent)"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&self) -> Result<(), ContractError> {
        info!(feed = %self.name, "LogSink closed");
        Ok(())
    }
}
