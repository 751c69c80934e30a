//! FeedHandle - owns one feed's queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, instrument, trace, warn};

use contracts::{ContractError, FeedSink, RelayedPacket};

use crate::metrics::FeedMetrics;

/// Handle to a running feed worker
///
/// The queue is unbounded and requests are not serialised behind one
/// another: a slow or unreachable endpoint never holds up later packets,
/// other feeds or the caller. Backlog shows up in `queue_len` and
/// `in_flight`.
pub struct FeedHandle {
    /// Feed name
    name: String,
    /// Channel to send packets to worker
    tx: mpsc::UnboundedSender<RelayedPacket>,
    /// Shared metrics
    metrics: Arc<FeedMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl FeedHandle {
    /// Create a new FeedHandle and spawn the worker task
    pub fn spawn<S: FeedSink + Sync + 'static>(sink: S) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(FeedMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            feed_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get feed name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<FeedMetrics> {
        &self.metrics
    }

    /// Queue a packet for delivery (never blocks)
    ///
    /// Returns false only if the worker has already stopped.
    pub fn enqueue(&self, relayed: RelayedPacket) -> bool {
        let seq = relayed.seq;
        match self.tx.send(relayed) {
            Ok(()) => {
                self.metrics.inc_enqueued();
                observability::record_feed_queue_depth(&self.name, self.metrics.queue_len());
                trace!(feed = %self.name, seq, "Packet queued");
                true
            }
            Err(_) => {
                self.metrics.inc_dropped_count();
                error!(feed = %self.name, seq, "Feed worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the feed worker once its queue is drained and every
    /// outstanding request has completed
    #[instrument(name = "feed_handle_shutdown", skip(self), fields(feed = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(feed = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(feed = %self.name, "FeedHandle shutdown complete");
    }
}

/// Worker task: sends packets in queue order without waiting for replies
///
/// Every delivery runs as its own task; outcomes are counted as they
/// complete. A stalled endpoint only accumulates `in_flight` requests.
#[instrument(name = "feed_worker_loop", skip(sink, rx, metrics), fields(feed = %name))]
async fn feed_worker<S: FeedSink + Sync + 'static>(
    sink: S,
    mut rx: mpsc::UnboundedReceiver<RelayedPacket>,
    metrics: Arc<FeedMetrics>,
    name: String,
) {
    debug!(feed = %name, "Feed worker started");

    let sink = Arc::new(sink);
    let mut outstanding = JoinSet::new();

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(relayed) = received else {
                    break;
                };
                metrics.set_queue_len(rx.len());
                observability::record_feed_queue_depth(&name, rx.len());
                metrics.inc_in_flight();

                let sink = Arc::clone(&sink);
                outstanding.spawn(async move {
                    let result = sink.deliver(&relayed).await;
                    (relayed, result)
                });
            }
            Some(joined) = outstanding.join_next(), if !outstanding.is_empty() => {
                record_outcome(&name, &metrics, joined);
            }
        }
    }

    debug!(feed = %name, outstanding = outstanding.len(), "Queue closed, waiting for replies");
    while let Some(joined) = outstanding.join_next().await {
        record_outcome(&name, &metrics, joined);
    }

    if let Err(e) = sink.close().await {
        error!(feed = %name, error = %e, "Close failed on shutdown");
    }

    debug!(feed = %name, "Feed worker stopped");
}

fn record_outcome(
    name: &str,
    metrics: &FeedMetrics,
    joined: Result<(RelayedPacket, Result<(), ContractError>), JoinError>,
) {
    metrics.dec_in_flight();
    match joined {
        Ok((_, Ok(()))) => {
            metrics.inc_delivered_count();
            observability::record_delivery(name, true);
        }
        Ok((relayed, Err(e))) => {
            metrics.inc_failure_count();
            observability::record_delivery(name, false);
            warn!(
                feed = %name,
                seq = relayed.seq,
                node = %relayed.node,
                error = %e,
                "Delivery failed"
            );
        }
        Err(e) => {
            metrics.inc_failure_count();
            observability::record_delivery(name, false);
            error!(feed = %name, error = %e, "Delivery task panicked");
        }
    }
}
