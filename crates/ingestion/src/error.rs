//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 事件信封解析失败
    #[error("malformed event envelope: {message}")]
    MalformedEnvelope {
        /// 错误消息
        message: String,
    },

    /// 输入描述无法识别
    #[error("invalid input '{input}': {message}")]
    InvalidInput {
        /// 原始输入描述
        input: String,
        /// 错误消息
        message: String,
    },

    /// 事件源打开失败
    #[error("failed to open source {source_name}: {error}")]
    SourceOpen {
        /// 事件源名称
        source_name: String,
        /// IO 错误
        #[source]
        error: std::io::Error,
    },

    /// 接收端已关闭
    #[error("event channel closed")]
    ChannelClosed,
}

impl IngestionError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            message: message.into(),
        }
    }

    pub fn invalid_input(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
