//! Relay orchestrator - coordinates all components.
//!
//! Event sources -> EventRouter -> Dispatcher. Mapping runs inline in the
//! relay loop; deliveries run on the dispatcher's per-feed workers.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{DecodedEvent, RelayConfig};
use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig, Transport};
use ingestion::{IngestionPipeline, InputSpec};
use mapper::{EventRouter, RouteOutcome};
use tracing::{debug, info, warn};

use super::RelayStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated relay configuration
    pub relay: RelayConfig,

    /// Where events come from
    pub input: InputSpec,

    /// HTTP delivery or log only
    pub transport: Transport,

    /// Maximum number of events to process (None = unlimited)
    pub max_events: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// How long to wait for pending deliveries on shutdown
    pub drain_timeout: Duration,
}

/// Main relay orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Open the configured input and run until it ends or `shutdown` fires
    pub async fn run<F>(self, shutdown: F) -> Result<RelayStats>
    where
        F: Future<Output = ()>,
    {
        let mut ingestion = IngestionPipeline::new(self.config.buffer_size);
        ingestion
            .register_input(&self.config.input)
            .await
            .map_err(|e| CliError::input(self.config.input.to_string(), e))?;

        self.run_with_ingestion(ingestion, shutdown).await
    }

    /// Run with preregistered event sources
    pub async fn run_with_ingestion<F>(
        self,
        mut ingestion: IngestionPipeline,
        shutdown: F,
    ) -> Result<RelayStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let relay = &self.config.relay;

        // Setup router
        let router = EventRouter::from_config(relay);
        info!(
            kinds = ?router.registered(),
            solar_policy = relay.solar_policy.as_str(),
            "Event router configured"
        );

        // Setup dispatcher
        let dispatcher = DispatcherBuilder::new(DispatcherConfig::from_relay_config(
            relay,
            self.config.transport,
        ))
        .build()
        .map_err(CliError::from)?;
        let feed_metrics = dispatcher.feed_metrics();
        info!(
            feeds = ?dispatcher.feed_names(),
            transport = ?self.config.transport,
            "Dispatcher configured"
        );

        // Start sources
        let rx = ingestion
            .take_receiver()
            .context("Event receiver already taken")?;
        ingestion.start_all();
        info!(max_events = ?self.config.max_events, "Relay running");

        let mut stats = RelayStats::default();

        let timeout = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping relay...");
                    break;
                }
                _ = &mut timeout => {
                    warn!(timeout = ?self.config.timeout, "Relay timed out");
                    break;
                }
                received = rx.recv() => {
                    let Ok(event) = received else {
                        info!("Event sources exhausted");
                        break;
                    };

                    relay_event(&router, &dispatcher, &event, &mut stats);

                    if stats.events.total_events % 100 == 0 {
                        debug!(events = stats.events.total_events, feeds = ?dispatcher.metrics(), "Relay progress");
                    }

                    if let Some(max) = self.config.max_events {
                        if stats.events.total_events >= max {
                            info!(events = stats.events.total_events, "Reached max events limit");
                            break;
                        }
                    }
                }
            }
        }

        // Shutdown
        info!("Shutting down relay...");
        ingestion.stop_all();
        stats.envelope_errors = ingestion.metrics().snapshot().parse_errors;

        if tokio::time::timeout(self.config.drain_timeout, dispatcher.shutdown())
            .await
            .is_err()
        {
            warn!(
                drain_timeout = ?self.config.drain_timeout,
                "Pending deliveries abandoned"
            );
        }

        stats.feeds = feed_metrics
            .iter()
            .map(|(name, metrics)| (name.clone(), metrics.snapshot()))
            .collect();
        stats.duration = start_time.elapsed();

        info!(
            events = stats.events.total_events,
            packets = stats.packets_dispatched,
            duration_secs = stats.duration.as_secs_f64(),
            "Relay shutdown complete"
        );

        Ok(stats)
    }
}

/// Map one event and hand any packet to the dispatcher
///
/// Failures affect only this event.
fn relay_event(
    router: &EventRouter,
    dispatcher: &Dispatcher,
    event: &DecodedEvent,
    stats: &mut RelayStats,
) {
    stats.events.on_event();
    observability::record_event_received(&event.name);

    let started = Instant::now();
    match router.route(event) {
        Ok(RouteOutcome::Relay(routed)) => {
            let latency_us = started.elapsed().as_secs_f64() * 1e6;
            observability::record_packet_built(routed.kind, latency_us);
            stats.events.on_packet(routed.kind, latency_us);

            let seq = dispatcher.dispatch(routed.node, routed.packet);
            stats.packets_dispatched += 1;
            debug!(event = %routed.kind, seq, "Packet relayed");
        }
        Ok(RouteOutcome::Consumed(kind)) => {
            stats.events.on_consumed();
            debug!(event = %kind, "Event handled, nothing to relay");
        }
        Ok(RouteOutcome::Ignored) => {
            observability::record_event_ignored();
            stats.events.on_ignored();
        }
        Err(e) => {
            observability::record_decode_error(e.event());
            stats.events.on_decode_error(e.event());
            warn!(event = %e.event(), error = %e, "Event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EventKind, FeedConfig, NodeId, NodeMap, SolarPolicy};
    use ingestion::MockEventSource;

    const ELECTRICITY: &str = r#"{
        "channels": {
            "0": [{"current": 120, "units": "w"}, {"day": 1.5, "units": "wh"}],
            "1": [{"current": 80, "units": "w"}, {"day": 0.9, "units": "wh"}],
            "2": [{"current": 0, "units": "w"}, {"day": 0, "units": "wh"}]
        },
        "signal": {"rssi": -40, "lqi": 99},
        "battery": 95
    }"#;

    const SOLAR: &str = r#"{
        "current": [{"generating": 350, "units": "w"}, {"exporting": 0, "units": "w"}],
        "day": [{"generated": -2, "units": "wh"}, {"exported": 0, "units": "wh"}]
    }"#;

    fn config(max_events: Option<u64>) -> PipelineConfig {
        PipelineConfig {
            relay: RelayConfig {
                debug: false,
                solar_policy: SolarPolicy::ClampDay,
                nodes: NodeMap {
                    electricity: Some(NodeId::Number(10)),
                    solar: Some(NodeId::Number(11)),
                    heating: None,
                },
                feeds: vec![FeedConfig {
                    url: "http://emoncms.example/input/post".into(),
                    key: "k".into(),
                    name: Some("home".into()),
                }],
            },
            input: InputSpec::Stdin,
            transport: Transport::Log,
            max_events,
            timeout: None,
            buffer_size: 8,
            drain_timeout: Duration::from_secs(5),
        }
    }

    fn ingestion_with(source: MockEventSource) -> IngestionPipeline {
        let mut ingestion = IngestionPipeline::new(8);
        ingestion.register_source(Box::new(source));
        ingestion
    }

    fn mixed_events() -> MockEventSource {
        MockEventSource::new("mock")
            .event("electricity", ELECTRICITY)
            .event("solar", SOLAR)
            .event("weather", r#"{"temperature": 7}"#)
            .event("hot_water", "{}")
            .event("electricity", r#"{"battery": 95}"#)
            .line("not an envelope")
    }

    #[tokio::test]
    async fn test_relay_counts_every_outcome() {
        let stats = Pipeline::new(config(None))
            .run_with_ingestion(ingestion_with(mixed_events()), std::future::pending())
            .await
            .unwrap();

        let summary = stats.events.summary();
        assert_eq!(summary.total_events, 5);
        assert_eq!(stats.packets_dispatched, 2);
        assert_eq!(summary.packets.get(&EventKind::Electricity), Some(&1));
        assert_eq!(summary.packets.get(&EventKind::Solar), Some(&1));
        assert_eq!(summary.consumed_events, 1);
        assert_eq!(summary.ignored_events, 1);
        assert_eq!(summary.decode_errors.get(&EventKind::Electricity), Some(&1));
        assert_eq!(stats.envelope_errors, 1);

        assert_eq!(stats.feeds.len(), 1);
        assert_eq!(stats.feeds[0].0, "home");
        assert_eq!(stats.feeds[0].1.delivered_count, 2);
        assert_eq!(stats.delivery_failures(), 0);
    }

    #[tokio::test]
    async fn test_max_events_limit() {
        let stats = Pipeline::new(config(Some(1)))
            .run_with_ingestion(ingestion_with(mixed_events()), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.events.total_events, 1);
        assert_eq!(stats.packets_dispatched, 1);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_relay() {
        let source = mixed_events().interval(Duration::from_secs(60));
        let stats = Pipeline::new(config(None))
            .run_with_ingestion(ingestion_with(source), std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(stats.events.total_events, 0);
        assert_eq!(stats.feeds[0].1.enqueued_count, 0);
    }

    #[tokio::test]
    async fn test_timeout_stops_relay() {
        let mut config = config(None);
        config.timeout = Some(Duration::from_millis(50));
        let source = MockEventSource::new("slow")
            .event("solar", SOLAR)
            .interval(Duration::from_secs(60));

        let stats = Pipeline::new(config)
            .run_with_ingestion(ingestion_with(source), std::future::pending())
            .await
            .unwrap();
        assert_eq!(stats.events.total_events, 0);
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let mut config = config(None);
        config.input = InputSpec::File("/nonexistent/owl/events.jsonl".into());

        let err = Pipeline::new(config)
            .run(std::future::pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open input"));
    }
}
