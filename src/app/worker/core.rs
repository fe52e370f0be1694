//! Core fetch worker implementation
//!
//! A worker repeatedly takes the next item from the shared queue, fetches it,
//! and sends the outcome to the archiver. It holds at most one item at a time,
//! so the number of workers bounds the number of fetches in flight.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::WorkerOutcome;
use crate::app::client::Fetch;
use crate::app::queue::WorkQueue;

/// Individual fetch worker
pub struct FetchWorker {
    /// Unique worker identifier
    id: u32,
    /// Shared work queue
    queue: Arc<WorkQueue>,
    /// Shared fetcher
    fetcher: Arc<dyn Fetch>,
    /// Channel to the archiving consumer
    results_tx: mpsc::Sender<WorkerOutcome>,
}

impl FetchWorker {
    /// Create a new fetch worker
    pub fn new(
        id: u32,
        queue: Arc<WorkQueue>,
        fetcher: Arc<dyn Fetch>,
        results_tx: mpsc::Sender<WorkerOutcome>,
    ) -> Self {
        Self {
            id,
            queue,
            fetcher,
            results_tx,
        }
    }

    /// Run until the queue is drained or closed, returning the number of items handled
    pub async fn run(self) -> usize {
        debug!("Worker {} starting", self.id);
        let mut handled = 0;

        while let Some(item) = self.queue.next_item().await {
            let result = self.fetcher.fetch(&item).await;
            handled += 1;

            if let Err(e) = &result {
                warn!("Worker {} failed to fetch '{}': {}", self.id, item.id, e);
                // Stop admission before reporting so no new item starts after a failure
                self.queue.close();
            }

            let outcome = WorkerOutcome {
                worker_id: self.id,
                item,
                result,
            };

            if let Err(mpsc::error::SendError(outcome)) = self.results_tx.send(outcome).await {
                debug!(
                    "Worker {} discarding result for '{}': batch no longer collecting",
                    self.id, outcome.item.id
                );
                break;
            }
        }

        debug!("Worker {} finished after {} item(s)", self.id, handled);
        handled
    }
}

impl std::fmt::Debug for FetchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchWorker").field("id", &self.id).finish()
    }
}
