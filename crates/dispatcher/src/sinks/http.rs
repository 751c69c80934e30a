//! HttpSink - delivers packets to an emonCMS-style ingestion endpoint
//!
//! One GET request per packet:
//! `<url>?json=<packet>&apikey=<key>&node=<node>`

use contracts::{ContractError, FeedConfig, FeedSink, RelayedPacket};
use reqwest::Client;
use tracing::{debug, instrument, Level};
use url::Url;

/// Configuration for HttpSink
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Ingestion endpoint, may already carry a path and query
    pub endpoint: Url,
    /// Write API key sent as `apikey`
    pub key: String,
}

impl HttpSinkConfig {
    /// Build from a feed entry
    pub fn from_feed(name: &str, feed: &FeedConfig) -> Result<Self, ContractError> {
        let endpoint = Url::parse(&feed.url)
            .map_err(|e| ContractError::feed_setup(name, format!("invalid url '{}': {e}", feed.url)))?;
        Ok(Self {
            endpoint,
            key: feed.key.clone(),
        })
    }
}

/// Sink that relays packets over HTTP
pub struct HttpSink {
    name: String,
    config: HttpSinkConfig,
    client: Client,
}

impl HttpSink {
    /// Create a sink sharing the given client's connection pool
    pub fn new(name: impl Into<String>, config: HttpSinkConfig, client: Client) -> Self {
        Self {
            name: name.into(),
            config,
            client,
        }
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    /// Compose the request URL for one packet
    ///
    /// Parameters are appended after any query the endpoint already has.
    pub fn request_url(&self, relayed: &RelayedPacket) -> Result<Url, ContractError> {
        let json = relayed.packet.to_json()?;
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("json", &json)
            .append_pair("apikey", &self.config.key)
            .append_pair("node", &relayed.node.to_string());
        Ok(url)
    }
}

impl FeedSink for HttpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_deliver",
        skip(self, relayed),
        fields(feed = %self.name, seq = relayed.seq, node = %relayed.node)
    )]
    async fn deliver(&self, relayed: &RelayedPacket) -> Result<(), ContractError> {
        let url = self.request_url(relayed)?;
        debug!(request = %url, "Sending packet");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContractError::delivery(&self.name, e.to_string()))?;

        // Status is not interpreted
        let status = response.status();
        if tracing::enabled!(Level::DEBUG) {
            match response.text().await {
                Ok(body) => debug!(status = %status, body = %body, "Response received"),
                Err(e) => debug!(status = %status, error = %e, "Response body unreadable"),
            }
        }
        Ok(())
    }

    #[instrument(name = "http_sink_close", skip(self), fields(feed = %self.name))]
    async fn close(&self) -> Result<(), ContractError> {
        debug!("HttpSink closed");
        Ok(())
    }
}
