//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 接收 `(NodeId, Packet)`
//! - Fan-out 到每个配置的 feed
//! - 每个 feed 独立队列，慢/失败的 feed 不阻塞其他 feed

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{FeedSink, RelayedPacket};
pub use dispatcher::{
    create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig, Transport,
};
pub use error::DispatcherError;
pub use handle::FeedHandle;
pub use metrics::{FeedMetrics, MetricsSnapshot};
pub use sinks::{HttpSink, HttpSinkConfig, LogSink};
