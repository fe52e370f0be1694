//! Core application logic for Media Archiver
//!
//! This module contains the item model, the HTTP fetcher, progress reporting,
//! the work queue and worker pool, the archive sink, and the batch archiver
//! that ties them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use media_archiver::app::{load_items, ArchiverSettings, BatchArchiver, BatchRequest};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let items = load_items(Path::new("items.json")).await?;
//!
//! let settings = ArchiverSettings::default().with_progress(false);
//! let archiver = BatchArchiver::new(&settings)?;
//!
//! let request = BatchRequest::new(items, "weekly").with_output_dir("archives");
//! let summary = archiver.run(request).await?;
//! println!("Archive written to {}", summary.archive_path.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod archiver;
pub mod client;
pub mod models;
pub mod progress;
pub mod queue;
pub mod worker;

// Re-export main public API
pub use archive::{archive_path, ArchiveWriter};
pub use archiver::{ArchiverSettings, BatchArchiver, BatchRequest, BatchSummary};
pub use client::{ClientConfig, Fetch, ProxyConfig, ResourceFetcher};
pub use models::{ensure_safe_ids, ensure_unique_ids, load_items, parse_items, Item};
pub use progress::{IndicatorHandle, IndicatorSnapshot, ProgressAggregator};
pub use queue::{QueueStats, WorkQueue};
pub use worker::{FetchWorker, PoolState, WorkerOutcome, WorkerPool};
