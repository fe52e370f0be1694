//! Batch request and archiver settings
//!
//! Everything here is checked before the first byte goes over the network.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::archive::archive_path;
use crate::app::client::ClientConfig;
use crate::app::models::{ensure_safe_ids, ensure_unique_ids, Item};
use crate::constants::archive;
use crate::errors::{ConfigError, ConfigResult};

/// Settings shared by every batch an archiver runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverSettings {
    /// HTTP client and proxy configuration
    pub client: ClientConfig,
    /// Show per-item progress bars
    pub progress: bool,
    /// Extension appended to each entry name
    pub entry_extension: String,
}

impl Default for ArchiverSettings {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            progress: true,
            entry_extension: archive::DEFAULT_ENTRY_EXTENSION.to_string(),
        }
    }
}

impl ArchiverSettings {
    /// Enable or disable progress bars
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Set the entry extension
    pub fn with_entry_extension(mut self, extension: impl Into<String>) -> Self {
        self.entry_extension = extension.into();
        self
    }
}

/// One batch: items to fetch and where to write the archive
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Items in admission order
    pub items: Vec<Item>,
    /// Maximum fetches in flight
    pub concurrency_limit: usize,
    /// Archive base name, without extension
    pub output_name: String,
    /// Directory for the archive; working directory when absent
    pub output_dir: Option<PathBuf>,
    /// Remove a partial archive left by an interrupted run instead of failing
    pub replace_partial: bool,
}

impl BatchRequest {
    /// Create a request with the given items and archive name
    pub fn new(items: Vec<Item>, output_name: impl Into<String>) -> Self {
        Self {
            items,
            concurrency_limit: crate::constants::DEFAULT_CONCURRENCY,
            output_name: output_name.into(),
            output_dir: None,
            replace_partial: false,
        }
    }

    /// Set the concurrency limit
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Take over a partial archive left by an interrupted run
    pub fn with_replace_partial(mut self, replace: bool) -> Self {
        self.replace_partial = replace;
        self
    }

    /// Validate the request
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero limit or an unusable
    /// name, `ConfigError::InvalidItemId` for an id that is not a plain file
    /// name, and `ConfigError::DuplicateItem` when two items share an id
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency_limit".to_string(),
                value: "0".to_string(),
                reason: "At least one fetch must be allowed".to_string(),
            });
        }

        validate_output_name(&self.output_name)?;
        ensure_safe_ids(&self.items)?;
        ensure_unique_ids(&self.items)
    }

    /// Create the output directory if needed and return the archive path
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutputDirectory` if the directory cannot be
    /// created or is not a directory
    pub async fn prepare_output(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.output_dir {
            ensure_directory(dir).await?;
        }
        Ok(archive_path(self.output_dir.as_deref(), &self.output_name))
    }
}

fn validate_output_name(name: &str) -> ConfigResult<()> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        field: "output_name".to_string(),
        value: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("Archive name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("Archive name cannot contain path separators"));
    }
    if name == "." || name == ".." {
        return Err(invalid("Archive name must name a file"));
    }
    Ok(())
}

async fn ensure_directory(dir: &Path) -> ConfigResult<()> {
    if let Err(source) = tokio::fs::create_dir_all(dir).await {
        return Err(ConfigError::OutputDirectory {
            path: dir.to_path_buf(),
            source: Some(source),
        });
    }

    match tokio::fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::OutputDirectory {
            path: dir.to_path_buf(),
            source: None,
        }),
        Err(source) => Err(ConfigError::OutputDirectory {
            path: dir.to_path_buf(),
            source: Some(source),
        }),
    }
}

/// Outcome of a successful batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Path of the finalized archive
    pub archive_path: PathBuf,
    /// Number of entries written
    pub entries: usize,
    /// Uncompressed bytes written
    pub total_bytes: u64,
    /// Wall-clock duration of the batch
    pub elapsed: Duration,
}
