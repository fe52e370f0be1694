//! Media Archiver Library
//!
//! Fetches a batch of remote media resources concurrently and packages them
//! into a single ZIP archive, with bounded concurrency, per-item progress and
//! all-or-nothing failure semantics.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
