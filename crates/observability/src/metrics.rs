//! Relay 指标收集模块
//!
//! Prometheus 计数器/仪表 + 内存聚合器（用于运行结束时输出摘要）。

use std::collections::BTreeMap;

use contracts::EventKind;
use metrics::{counter, gauge, histogram};

/// 记录收到的网关事件
pub fn record_event_received(event: &str) {
    counter!("owl_relay_events_total", "event" => event.to_string()).increment(1);
}

/// 记录未注册处理器的事件
pub fn record_event_ignored() {
    counter!("owl_relay_events_ignored_total").increment(1);
}

/// 记录解码失败
pub fn record_decode_error(event: EventKind) {
    counter!("owl_relay_decode_errors_total", "event" => event.as_str()).increment(1);
}

/// 记录已生成并分发的数据包
pub fn record_packet_built(event: EventKind, map_latency_us: f64) {
    counter!("owl_relay_packets_total", "event" => event.as_str()).increment(1);
    histogram!("owl_relay_map_latency_us", "event" => event.as_str()).record(map_latency_us);
}

/// 记录单个 feed 的投递结果
pub fn record_delivery(feed: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "owl_relay_deliveries_total",
        "feed" => feed.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录 feed 队列深度
pub fn record_feed_queue_depth(feed: &str, depth: usize) {
    gauge!("owl_relay_feed_queue_depth", "feed" => feed.to_string()).set(depth as f64);
}

/// Relay 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RelayMetricsAggregator {
    /// 收到的事件总数
    pub total_events: u64,

    /// 被忽略的事件数（未知类型 / 未配置节点）
    pub ignored_events: u64,

    /// 处理但不转发的事件数（weather / log-only solar）
    pub consumed_events: u64,

    /// 各事件类型的数据包数
    pub packets: BTreeMap<EventKind, u64>,

    /// 各事件类型的解码失败数
    pub decode_errors: BTreeMap<EventKind, u64>,

    /// 映射耗时统计 (微秒)
    pub map_latency_us: RunningStats,
}

impl RelayMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self) {
        self.total_events += 1;
    }

    pub fn on_ignored(&mut self) {
        self.ignored_events += 1;
    }

    pub fn on_consumed(&mut self) {
        self.consumed_events += 1;
    }

    pub fn on_packet(&mut self, kind: EventKind, map_latency_us: f64) {
        *self.packets.entry(kind).or_insert(0) += 1;
        self.map_latency_us.push(map_latency_us);
    }

    pub fn on_decode_error(&mut self, kind: EventKind) {
        *self.decode_errors.entry(kind).or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total_packets = self.packets.values().sum();
        let total_decode_errors: u64 = self.decode_errors.values().sum();
        MetricsSummary {
            total_events: self.total_events,
            ignored_events: self.ignored_events,
            consumed_events: self.consumed_events,
            total_packets,
            total_decode_errors,
            decode_error_rate: if self.total_events > 0 {
                total_decode_errors as f64 / self.total_events as f64 * 100.0
            } else {
                0.0
            },
            packets: self.packets.clone(),
            decode_errors: self.decode_errors.clone(),
            map_latency_us: StatsSummary::from(&self.map_latency_us),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_events: u64,
    pub ignored_events: u64,
    pub consumed_events: u64,
    pub total_packets: u64,
    pub total_decode_errors: u64,
    pub decode_error_rate: f64,
    pub packets: BTreeMap<EventKind, u64>,
    pub decode_errors: BTreeMap<EventKind, u64>,
    pub map_latency_us: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relay Metrics Summary ===")?;
        writeln!(f, "Events: {}", self.total_events)?;
        writeln!(f, "Ignored: {}", self.ignored_events)?;
        writeln!(f, "Not relayed: {}", self.consumed_events)?;
        writeln!(f, "Packets: {}", self.total_packets)?;
        writeln!(
            f,
            "Decode errors: {} ({:.2}%)",
            self.total_decode_errors, self.decode_error_rate
        )?;
        writeln!(f, "Map latency (us): {}", self.map_latency_us)?;

        for (kind, count) in &self.packets {
            writeln!(f, "  {kind}: {count} packets")?;
        }
        for (kind, count) in &self.decode_errors {
            writeln!(f, "  {kind}: {count} decode errors")?;
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1} (n={})",
                self.min, self.max, self.mean, self.count
            )
        }
    }
}

/// 在线统计：最小/最大/均值
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.mean += (value - self.mean) / self.count as f64;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
