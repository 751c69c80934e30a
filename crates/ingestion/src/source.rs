//! 事件源 trait

use std::sync::Arc;

use async_channel::Sender;
use contracts::DecodedEvent;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::IngestionMetrics;
use crate::envelope::parse_envelopes;

/// 事件源 trait
///
/// 每种输入实现此 trait，负责：
/// 1. 读取原始信封文本
/// 2. 解析为 `DecodedEvent`
/// 3. 发送到共享通道（通道满时等待）
pub trait EventSource: Send {
    /// 事件源名称（日志用）
    fn name(&self) -> &str;

    /// 启动读取任务
    ///
    /// 任务在输入结束或接收端关闭时退出。
    fn spawn(self: Box<Self>, tx: Sender<DecodedEvent>, metrics: Arc<IngestionMetrics>)
        -> JoinHandle<()>;
}

/// Parse a raw buffer and forward every event it holds
///
/// Malformed envelopes are counted and skipped. Returns `false` once the
/// receiver is gone.
pub(crate) async fn forward(
    source: &str,
    raw: &str,
    tx: &Sender<DecodedEvent>,
    metrics: &IngestionMetrics,
) -> bool {
    for parsed in parse_envelopes(raw) {
        match parsed {
            Ok(event) => {
                metrics.record_received();
                trace!(source, event = %event.name, "event received");
                if tx.send(event).await.is_err() {
                    debug!(source, "receiver closed");
                    return false;
                }
                metrics.update_queue_len(tx.len());
            }
            Err(e) => {
                metrics.record_parse_error();
                warn!(source, error = %e, "skipping malformed envelope");
            }
        }
    }
    true
}
