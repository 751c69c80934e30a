//! Mock 事件源
//!
//! 用于无网关环境的测试：按顺序回放预置的信封。

use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use contracts::DecodedEvent;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::IngestionMetrics;
use crate::source::{forward, EventSource};

/// Mock 事件源
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    name: String,
    lines: Vec<String>,
    interval: Option<Duration>,
}

impl MockEventSource {
    /// 创建新的 Mock 事件源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 追加一条原始信封文本（可以是无效内容）
    pub fn line(mut self, raw: impl Into<String>) -> Self {
        self.lines.push(raw.into());
        self
    }

    /// 追加一个事件，payload 以字符串形式携带
    pub fn event(self, name: &str, payload: &str) -> Self {
        let raw = json!({ "event": name, "payload": payload }).to_string();
        self.line(raw)
    }

    /// 每条信封之间的间隔
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// 预置信封数量
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl EventSource for MockEventSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(
        self: Box<Self>,
        tx: Sender<DecodedEvent>,
        metrics: Arc<IngestionMetrics>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            for raw in &self.lines {
                if let Some(interval) = self.interval {
                    tokio::time::sleep(interval).await;
                }
                if !forward(&self.name, raw, &tx, &metrics).await {
                    break;
                }
            }
            debug!(source = %self.name, "mock source exhausted");
        })
    }
}
