//! Prelude module for Media Archiver Library
//!
//! Re-exports the items needed for typical usage with a single
//! `use media_archiver::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use media_archiver::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let archiver = BatchArchiver::new(&ArchiverSettings::default())?;
//!     let items = vec![Item::new("a", "https://cdn.example.com/a.mp4")];
//!     let summary = archiver.run(BatchRequest::new(items, "clips")).await?;
//!     println!("{} entries", summary.entries);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components
pub use crate::app::{
    load_items, ArchiverSettings, BatchArchiver, BatchRequest, BatchSummary, ClientConfig, Fetch,
    Item, ProgressAggregator, ProxyConfig, ResourceFetcher,
};

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_CONCURRENCY, DEFAULT_ENTRY_EXTENSION, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
