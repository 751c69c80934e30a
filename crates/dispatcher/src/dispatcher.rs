//! Dispatcher - fan-out of relayed packets to every feed

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info, instrument};

use contracts::{feed_labels, FeedConfig, NodeId, Packet, RelayConfig, RelayedPacket};

use crate::error::DispatcherError;
use crate::handle::FeedHandle;
use crate::metrics::{FeedMetrics, MetricsSnapshot};
use crate::sinks::{HttpSink, HttpSinkConfig, LogSink};

/// How packets leave the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// HTTP GET to each feed endpoint
    #[default]
    Http,
    /// Log only, nothing is sent
    Log,
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Feeds, in delivery order
    pub feeds: Vec<FeedConfig>,
    /// Transport used for every feed
    pub transport: Transport,
}

impl DispatcherConfig {
    pub fn from_relay_config(config: &RelayConfig, transport: Transport) -> Self {
        Self {
            feeds: config.feeds.clone(),
            transport,
        }
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    client: Option<Client>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Use a preconfigured HTTP client instead of the default one
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the dispatcher and start one worker per feed
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(feed_count = self.config.feeds.len(), transport = ?self.config.transport)
    )]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let client = match (self.config.transport, self.client) {
            (_, Some(client)) => client,
            (Transport::Http, None) => Client::builder()
                .user_agent(concat!("owl-relay/", env!("CARGO_PKG_VERSION")))
                .build()?,
            // Never used by LogSink
            (Transport::Log, None) => Client::new(),
        };

        let labels = feed_labels(&self.config.feeds);
        let mut handles = Vec::with_capacity(self.config.feeds.len());
        for (name, feed) in labels.into_iter().zip(&self.config.feeds) {
            handles.push(create_feed_handle(
                name,
                feed,
                self.config.transport,
                &client,
            )?);
        }
        Ok(Dispatcher::with_handles(handles))
    }
}

/// Create a FeedHandle from configuration
#[instrument(
    name = "dispatcher_create_feed_handle",
    skip(feed, client),
    fields(url = %feed.url)
)]
fn create_feed_handle(
    name: String,
    feed: &FeedConfig,
    transport: Transport,
    client: &Client,
) -> Result<FeedHandle, DispatcherError> {
    match transport {
        Transport::Http => {
            let config = HttpSinkConfig::from_feed(&name, feed)
                .map_err(|e| DispatcherError::feed_creation(&name, e.to_string()))?;
            Ok(FeedHandle::spawn(HttpSink::new(name, config, client.clone())))
        }
        Transport::Log => Ok(FeedHandle::spawn(LogSink::new(name, &feed.url))),
    }
}

/// Fans every packet out to all feeds
///
/// `dispatch` only enqueues; each feed delivers from its own worker, so a
/// slow or failing feed affects nothing but itself.
pub struct Dispatcher {
    handles: Vec<FeedHandle>,
    next_seq: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher with custom feed handles (for testing)
    pub fn with_handles(handles: Vec<FeedHandle>) -> Self {
        info!(feeds = handles.len(), "Dispatcher started");
        Self {
            handles,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of feeds
    pub fn feed_count(&self) -> usize {
        self.handles.len()
    }

    /// Feed names, in delivery order
    pub fn feed_names(&self) -> Vec<&str> {
        self.handles.iter().map(FeedHandle::name).collect()
    }

    /// Get metrics for all feeds, in delivery order
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Shared metrics handles, still readable after shutdown
    pub fn feed_metrics(&self) -> Vec<(String, Arc<FeedMetrics>)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect()
    }

    /// Hand one packet to every feed, in configured order
    ///
    /// Returns the sequence number assigned to the packet. Delivery
    /// outcomes are not reported back.
    #[instrument(name = "dispatcher_dispatch", skip(self, packet), fields(node = %node))]
    pub fn dispatch(&self, node: NodeId, packet: Packet) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let relayed = RelayedPacket::new(seq, node, packet);

        for handle in &self.handles {
            handle.enqueue(relayed.clone());
        }

        debug!(seq, feeds = self.handles.len(), "Packet dispatched");
        seq
    }

    /// Close all queues and wait for pending deliveries
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.shutdown().await;
        }
        info!("Dispatcher shutdown complete");
    }
}

/// Convenience function to create a dispatcher from relay configuration
pub fn create_dispatcher(
    config: &RelayConfig,
    transport: Transport,
) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(DispatcherConfig::from_relay_config(config, transport)).build()
}
