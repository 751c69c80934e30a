//! Relay run statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::RelayMetricsAggregator;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Per-event counters and mapping latency
    pub events: RelayMetricsAggregator,

    /// Packets handed to the dispatcher
    pub packets_dispatched: u64,

    /// Envelopes rejected before routing
    pub envelope_errors: u64,

    /// Per-feed delivery counters, in feed order
    pub feeds: Vec<(String, MetricsSnapshot)>,

    /// Total duration of the run
    pub duration: Duration,
}

impl RelayStats {
    /// Events processed per second
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events.total_events as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Delivery attempts that failed, across all feeds
    pub fn delivery_failures(&self) -> u64 {
        self.feeds.iter().map(|(_, m)| m.failure_count).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = self.events.summary();

        println!("\n=== Relay Statistics ===\n");
        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Events: {} ({:.2}/s)", summary.total_events, self.events_per_sec());
        println!("   Malformed envelopes: {}", self.envelope_errors);
        println!("   Ignored events: {}", summary.ignored_events);
        println!("   Not relayed: {}", summary.consumed_events);
        println!("   Packets dispatched: {}", self.packets_dispatched);
        println!(
            "   Decode errors: {} ({:.2}%)",
            summary.total_decode_errors, summary.decode_error_rate
        );
        println!("   Map latency (us): {}", summary.map_latency_us);

        if !summary.packets.is_empty() {
            println!("\nPackets by event");
            for (kind, count) in &summary.packets {
                println!("   {kind}: {count}");
            }
        }

        if !self.feeds.is_empty() {
            println!("\nFeeds");
            for (name, m) in &self.feeds {
                println!(
                    "   {name}: delivered={}, failed={}, pending={}, unanswered={}",
                    m.delivered_count, m.failure_count, m.queue_len, m.in_flight
                );
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_and_failures() {
        let mut stats = RelayStats {
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        for _ in 0..10 {
            stats.events.on_event();
        }
        stats.feeds = vec![
            (
                "a".into(),
                MetricsSnapshot {
                    failure_count: 2,
                    ..Default::default()
                },
            ),
            (
                "b".into(),
                MetricsSnapshot {
                    failure_count: 1,
                    ..Default::default()
                },
            ),
        ];

        assert!((stats.events_per_sec() - 5.0).abs() < 1e-10);
        assert_eq!(stats.delivery_failures(), 3);
        assert!((RelayStats::default().events_per_sec()).abs() < 1e-10);
    }
}
