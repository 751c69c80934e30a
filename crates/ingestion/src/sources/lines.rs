//! JSON-lines 事件源（stdin / 文件）

use std::path::Path;
use std::sync::Arc;

use async_channel::Sender;
use contracts::DecodedEvent;
use tokio::fs::File;
use tokio::io::{stdin, AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::source::{forward, EventSource};

/// Reads one envelope per line until end of input
pub struct LineSource<R> {
    name: String,
    reader: R,
}

impl LineSource<BufReader<Stdin>> {
    /// Read envelopes piped in on standard input
    pub fn stdin() -> Self {
        Self::new("stdin", BufReader::new(stdin()))
    }
}

impl LineSource<BufReader<File>> {
    /// Read envelopes from a file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let file = File::open(path)
            .await
            .map_err(|error| IngestionError::SourceOpen {
                source_name: name.clone(),
                error,
            })?;
        Ok(Self::new(name, BufReader::new(file)))
    }
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }

    #[instrument(name = "line_source_run", skip_all, fields(source = %self.name))]
    async fn run(self, tx: Sender<DecodedEvent>, metrics: Arc<IngestionMetrics>) {
        info!(source = %self.name, "reading events");
        let mut reader = self.reader;
        let mut buf = Vec::new();
        let mut line_count = 0u64;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    debug!(source = %self.name, lines = line_count, "end of input");
                    break;
                }
                Ok(_) => {
                    line_count += 1;
                    let Ok(line) = std::str::from_utf8(&buf) else {
                        metrics.record_parse_error();
                        warn!(source = %self.name, line = line_count, "line is not UTF-8");
                        continue;
                    };
                    if !forward(&self.name, line, &tx, &metrics).await {
                        break;
                    }
                }
                Err(e) => {
                    error!(source = %self.name, line = line_count + 1, error = %e, "read failed");
                    break;
                }
            }
        }
    }
}

impl<R> EventSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(
        self: Box<Self>,
        tx: Sender<DecodedEvent>,
        metrics: Arc<IngestionMetrics>,
    ) -> JoinHandle<()> {
        tokio::spawn((*self).run(tx, metrics))
    }
}
