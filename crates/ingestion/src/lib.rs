//! # Ingestion Pipeline
//!
//! Gateway event ingestion module.
//!
//! Responsibilities:
//! - Read decoded gateway events (stdin, file, UDP, or mock)
//! - Parse event envelopes into `DecodedEvent`
//! - Merge every source into one bounded async-channel stream
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, InputSpec};
//!
//! let mut pipeline = IngestionPipeline::new(100);
//! pipeline.register_input(&"udp://0.0.0.0:5100".parse::<InputSpec>()?).await?;
//!
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start_all();
//! while let Ok(event) = rx.recv().await {
//!     // route event
//! }
//! ```

mod config;
mod envelope;
mod error;
mod pipeline;
mod source;
mod sources;

// Re-exports
pub use config::{IngestionMetrics, InputSpec, MetricsSnapshot};
pub use contracts::DecodedEvent;
pub use envelope::{parse_envelope, parse_envelopes};
pub use error::{IngestionError, Result};
pub use pipeline::IngestionPipeline;
pub use source::EventSource;
pub use sources::{LineSource, MockEventSource, UdpSource};
