//! Batch orchestration
//!
//! The archiver runs a fixed-size worker pool over one batch of items and
//! funnels every fetched buffer into a single ZIP archive. The batch is
//! all-or-nothing: the first failure stops admission, discards whatever is
//! still in flight, removes the partial archive and returns the error.
//!
//! # Architecture
//!
//! - [`config`] - Batch request validation, settings and the result summary
//!
//! Fetching is done by workers (see [`crate::app::worker`]); appending is done
//! here, by the single consumer of the results channel.
//!
//! # Examples
//!
//! ```rust,no_run
//! use media_archiver::app::{ArchiverSettings, BatchArchiver, BatchRequest, Item};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let archiver = BatchArchiver::new(&ArchiverSettings::default())?;
//! let request = BatchRequest::new(
//!     vec![Item::new("a", "https://cdn.example.com/a.mp4")],
//!     "clips",
//! )
//! .with_concurrency_limit(2);
//!
//! let summary = archiver.run(request).await?;
//! println!("Wrote {} entries to {}", summary.entries, summary.archive_path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::app::archive::ArchiveWriter;
use crate::app::client::{Fetch, ResourceFetcher};
use crate::app::progress::ProgressAggregator;
use crate::app::queue::WorkQueue;
use crate::app::worker::{WorkerOutcome, WorkerPool};
use crate::errors::{QueueError, Result};

pub use config::{ArchiverSettings, BatchRequest, BatchSummary};

/// Runs batches of fetches into single archives
pub struct BatchArchiver {
    fetcher: Arc<dyn Fetch>,
    progress: Option<Arc<ProgressAggregator>>,
    entry_extension: String,
}

impl BatchArchiver {
    /// Create an archiver fetching over HTTP
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client or proxy is invalid
    pub fn new(settings: &ArchiverSettings) -> Result<Self> {
        let progress = Arc::new(ProgressAggregator::new(settings.progress));
        let fetcher = ResourceFetcher::new(&settings.client, progress.clone())?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            progress: Some(progress),
            entry_extension: settings.entry_extension.clone(),
        })
    }

    /// Create an archiver around any fetcher
    pub fn with_fetcher(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            progress: None,
            entry_extension: crate::constants::DEFAULT_ENTRY_EXTENSION.to_string(),
        }
    }

    /// Set the entry extension
    pub fn with_entry_extension(mut self, extension: impl Into<String>) -> Self {
        self.entry_extension = extension.into();
        self
    }

    /// Progress aggregator shared with the fetcher, if this archiver owns one
    pub fn progress(&self) -> Option<&Arc<ProgressAggregator>> {
        self.progress.as_ref()
    }

    /// Fetch every item and write them into one archive
    ///
    /// # Errors
    ///
    /// Returns the first configuration, fetch, or archive error. No archive is
    /// left at the output path when an error is returned.
    pub async fn run(&self, request: BatchRequest) -> Result<BatchSummary> {
        let started = Instant::now();
        request.validate()?;
        let archive_path = request.prepare_output().await?;

        let total = request.items.len();
        let worker_count = request.concurrency_limit.min(total);
        info!(
            "Archiving {} item(s) into {} with {} worker(s)",
            total,
            archive_path.display(),
            worker_count
        );

        let mut archive = if request.replace_partial {
            ArchiveWriter::create_replacing_partial(&archive_path).await?
        } else {
            ArchiveWriter::create(&archive_path).await?
        };
        let queue = Arc::new(WorkQueue::new(request.items));
        let (results_tx, results_rx) = mpsc::channel(request.concurrency_limit);

        let mut pool = WorkerPool::new(worker_count, queue.clone(), self.fetcher.clone());
        if let Err(e) = pool.start(results_tx) {
            archive.abort().await;
            return Err(e.into());
        }

        if let Err(e) = self.collect(&mut archive, results_rx).await {
            error!("Batch failed ({}): {}", e.category(), e);
            queue.close();
            pool.detach();
            archive.abort().await;
            self.clear_progress();
            return Err(e);
        }

        let handled = pool.join().await;
        debug!("Workers handled {} item(s)", handled);

        if archive.entries() < total {
            let missing = total - archive.entries();
            error!("{} item(s) were never reported by the workers", missing);
            archive.abort().await;
            self.clear_progress();
            return Err(QueueError::WorkerTerminated { missing }.into());
        }

        let entries = archive.entries();
        let total_bytes = archive.bytes_written();
        let archive_path = archive.finalize().await?;
        self.clear_progress();

        let summary = BatchSummary {
            archive_path,
            entries,
            total_bytes,
            elapsed: started.elapsed(),
        };
        info!(
            "Batch complete: {} entries, {} bytes in {:.2?}",
            summary.entries, summary.total_bytes, summary.elapsed
        );
        Ok(summary)
    }

    /// Append outcomes until the channel closes or something fails
    ///
    /// Takes the receiver by value: returning early drops it, so results still
    /// in flight are discarded by their workers.
    async fn collect(
        &self,
        archive: &mut ArchiveWriter,
        mut results_rx: mpsc::Receiver<WorkerOutcome>,
    ) -> Result<()> {
        while let Some(outcome) = results_rx.recv().await {
            let data = outcome.result?;
            let entry = outcome.item.entry_name(&self.entry_extension);
            debug!(
                "Worker {} delivered '{}' ({} bytes)",
                outcome.worker_id,
                entry,
                data.len()
            );
            archive.append(&entry, data).await?;
        }
        Ok(())
    }

    fn clear_progress(&self) {
        if let Some(progress) = &self.progress {
            progress.clear();
        }
    }
}

impl std::fmt::Debug for BatchArchiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchArchiver")
            .field("entry_extension", &self.entry_extension)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
