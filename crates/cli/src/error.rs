//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration loading or validation error
    #[error("Invalid configuration {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: contracts::ContractError,
    },

    /// Event input could not be opened
    #[error("Failed to open input '{input}': {source}")]
    Input {
        input: String,
        #[source]
        source: ingestion::IngestionError,
    },

    /// Feed transports could not be created
    #[error("Failed to start dispatcher: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config(path: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::Config {
            path: path.into(),
            source,
        }
    }

    pub fn input(input: impl Into<String>, source: ingestion::IngestionError) -> Self {
        Self::Input {
            input: input.into(),
            source,
        }
    }
}
