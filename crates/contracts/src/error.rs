//! Layered error definitions
//!
//! Categorized by source: config / delivery

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Packet Errors =====
    /// Packet could not be encoded for the wire
    #[error("packet encode error: {0}")]
    PacketEncode(#[from] serde_json::Error),

    // ===== Delivery Errors =====
    /// Request to a feed endpoint failed before a response arrived
    #[error("feed '{feed}' delivery error: {message}")]
    Delivery { feed: String, message: String },

    /// Feed endpoint could not be set up
    #[error("feed '{feed}' setup error: {message}")]
    FeedSetup { feed: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(feed: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            feed: feed.into(),
            message: message.into(),
        }
    }

    /// Create feed setup error
    pub fn feed_setup(feed: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeedSetup {
            feed: feed.into(),
            message: message.into(),
        }
    }
}
