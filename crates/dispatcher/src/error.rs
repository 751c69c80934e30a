//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Feed transport creation error
    #[error("failed to create feed '{name}': {message}")]
    FeedCreation { name: String, message: String },

    /// Shared HTTP client could not be built
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Transport error (from contract)
    #[error("feed error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a feed creation error
    pub fn feed_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeedCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
