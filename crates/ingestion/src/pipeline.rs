//! Ingestion Pipeline main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::DecodedEvent;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::config::{IngestionMetrics, InputSpec};
use crate::error::Result;
use crate::source::EventSource;
use crate::sources::{LineSource, UdpSource};

/// Ingestion Pipeline
///
/// Owns the registered event sources and merges them into one bounded
/// stream. The stream ends once every source has finished.
pub struct IngestionPipeline {
    /// Registered, not yet started sources
    sources: Vec<Box<dyn EventSource>>,

    /// Running source tasks
    tasks: Vec<(String, JoinHandle<()>)>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Sender handed to sources, dropped after start
    tx: Option<Sender<DecodedEvent>>,

    /// Data receiver
    rx: Option<Receiver<DecodedEvent>>,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Channel capacity
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity.max(1));

        Self {
            sources: Vec::new(),
            tasks: Vec::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx: Some(tx),
            rx: Some(rx),
        }
    }

    /// Register an event source
    #[instrument(name = "ingestion_register_source", skip_all, fields(source = %source.name()))]
    pub fn register_source(&mut self, source: Box<dyn EventSource>) {
        debug!(source = %source.name(), "registered event source");
        self.sources.push(source);
    }

    /// Open and register the source described by `input`
    pub async fn register_input(&mut self, input: &InputSpec) -> Result<()> {
        let source: Box<dyn EventSource> = match input {
            InputSpec::Stdin => Box::new(LineSource::stdin()),
            InputSpec::File(path) => Box::new(LineSource::open(path).await?),
            InputSpec::Udp(addr) => Box::new(UdpSource::bind(addr).await?),
        };
        self.register_source(source);
        Ok(())
    }

    /// Start all registered sources
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&mut self) {
        let Some(tx) = self.tx.take() else {
            debug!("ingestion already started");
            return;
        };

        info!(count = self.sources.len(), "starting event sources");
        for source in self.sources.drain(..) {
            let name = source.name().to_string();
            let handle = source.spawn(tx.clone(), Arc::clone(&self.metrics));
            self.tasks.push((name, handle));
        }
    }

    /// Stop all sources that are still running
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&mut self) {
        info!(count = self.tasks.len(), "stopping event sources");
        for (name, handle) in self.tasks.drain(..) {
            if !handle.is_finished() {
                debug!(source = %name, "aborting source");
                handle.abort();
            }
        }
    }

    /// Get data stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<DecodedEvent>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Registered plus running source count
    pub fn source_count(&self) -> usize {
        self.sources.len() + self.tasks.len()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockEventSource;

    #[tokio::test]
    async fn test_pipeline_merges_sources_and_closes() {
        let mut pipeline = IngestionPipeline::new(4);
        pipeline.register_source(Box::new(
            MockEventSource::new("a").event("solar", "{}").event("solar", "{}"),
        ));
        pipeline.register_source(Box::new(MockEventSource::new("b").event("heating", "{}")));
        assert_eq!(pipeline.source_count(), 2);

        let rx = pipeline.take_receiver().unwrap();
        assert!(pipeline.take_receiver().is_none());
        pipeline.start_all();

        let mut names = Vec::new();
        while let Ok(event) = rx.recv().await {
            names.push(event.name);
        }
        names.sort();
        assert_eq!(names, vec!["heating", "solar", "solar"]);
        assert_eq!(pipeline.metrics().snapshot().events_received, 3);
    }

    #[tokio::test]
    async fn test_register_file_input() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"event": "weather", "payload": {{}}}}"#).unwrap();

        let mut pipeline = IngestionPipeline::new(4);
        let input = InputSpec::File(file.path().to_path_buf());
        pipeline.register_input(&input).await.unwrap();

        let rx = pipeline.take_receiver().unwrap();
        pipeline.start_all();
        assert_eq!(rx.recv().await.unwrap().name, "weather");
        assert!(rx.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_stop_aborts_udp_source() {
        let mut pipeline = IngestionPipeline::new(4);
        pipeline
            .register_input(&InputSpec::Udp("127.0.0.1:0".into()))
            .await
            .unwrap();

        let rx = pipeline.take_receiver().unwrap();
        pipeline.start_all();
        pipeline.stop_all();

        // Aborted task drops its sender, closing the stream
        assert!(rx.recv().await.is_err());
    }
}
