//! Worker pool management
//!
//! The pool spawns a fixed number of fetch workers over one shared queue.
//! Dropping or detaching the pool does not cancel workers: anything already in
//! flight runs to completion and its result is discarded once the archiver has
//! stopped receiving.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::core::FetchWorker;
use super::types::{PoolState, WorkerOutcome};
use crate::app::client::Fetch;
use crate::app::queue::WorkQueue;
use crate::errors::QueueError;

/// Fixed-size pool of fetch workers
pub struct WorkerPool {
    /// Number of workers to spawn
    worker_count: usize,
    /// Shared work queue
    queue: Arc<WorkQueue>,
    /// Shared fetcher
    fetcher: Arc<dyn Fetch>,
    /// Worker task handles
    worker_handles: Vec<JoinHandle<usize>>,
    /// Pool state
    state: PoolState,
}

impl WorkerPool {
    /// Create a new worker pool
    pub fn new(worker_count: usize, queue: Arc<WorkQueue>, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            worker_count,
            queue,
            fetcher,
            worker_handles: Vec::new(),
            state: PoolState::Created,
        }
    }

    /// Spawn all workers
    ///
    /// The pool keeps no sender of its own: once every worker has finished the
    /// results channel closes.
    pub fn start(&mut self, results_tx: mpsc::Sender<WorkerOutcome>) -> Result<(), QueueError> {
        if self.state != PoolState::Created {
            return Err(QueueError::InvalidState {
                state: self.state.to_string(),
            });
        }

        info!("Starting {} workers", self.worker_count);
        for worker_id in 0..self.worker_count {
            let worker = FetchWorker::new(
                worker_id as u32,
                self.queue.clone(),
                self.fetcher.clone(),
                results_tx.clone(),
            );
            self.worker_handles
                .push(tokio::spawn(async move { worker.run().await }));
        }

        self.state = PoolState::Running;
        Ok(())
    }

    /// Wait for every worker and return the total number of items they handled
    pub async fn join(mut self) -> usize {
        let mut handled = 0;
        for handle in self.worker_handles.drain(..) {
            match handle.await {
                Ok(count) => handled += count,
                Err(e) => warn!("Worker task failed: {}", e),
            }
        }
        handled
    }

    /// Release the worker handles without waiting
    pub fn detach(mut self) {
        let running = self
            .worker_handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .count();
        if running > 0 {
            debug!("Detaching pool with {} worker(s) still running", running);
        }
        self.worker_handles.clear();
        self.state = PoolState::Detached;
    }

    /// Get the current pool state
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Number of workers this pool spawns
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count)
            .field("state", &self.state)
            .finish()
    }
}
