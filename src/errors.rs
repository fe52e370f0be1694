//! Error types for Media Archiver
//!
//! Errors are grouped by the component that raises them. Every batch exposes a
//! single [`AppError`] on failure; the per-component enums keep enough context
//! to tell the user what went wrong and what to try next.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching a single remote resource
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, timeout, proxy or mid-stream transport failure
    #[error(
        "Can't download media for '{id}' from {url}. If you were using a proxy, please try without it"
    )]
    Transport {
        id: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for '{id}' ({url})")]
    Status { id: String, url: String, status: u16 },

    /// Source URL could not be parsed
    #[error("Invalid URL for '{id}': {url} - {reason}")]
    InvalidUrl {
        id: String,
        url: String,
        reason: String,
    },
}

impl FetchError {
    /// Identifier of the item whose fetch failed
    pub fn item_id(&self) -> &str {
        match self {
            FetchError::Transport { id, .. }
            | FetchError::Status { id, .. }
            | FetchError::InvalidUrl { id, .. } => id,
        }
    }
}

/// Errors raised by the archive sink
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Output file could not be created
    #[error("Failed to create archive at {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another writer is already producing this archive
    #[error("Archive {path} is already being written (rerun with --force if no other run is active)")]
    InUse { path: PathBuf },

    /// Appending an entry failed
    #[error("Failed to write entry '{entry}' to archive")]
    Write {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Flushing or closing the archive failed
    #[error("Failed to finalize archive {path}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Sink was used after it was finalized or aborted
    #[error("Archive sink is closed")]
    Closed,

    /// Generic I/O error (rename, remove, flush)
    #[error("Archive I/O error")]
    Io(#[from] std::io::Error),
}

/// Item manifest parsing errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Item manifest not found: {path}")]
    NotFound { path: PathBuf },

    /// JSON parsing error
    #[error("Invalid item manifest at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },

    /// Item specification on the command line was not `ID=URL`
    #[error("Invalid item '{spec}'. Expected ID=URL")]
    InvalidItemSpec { spec: String },

    /// I/O error reading manifest
    #[error("I/O error reading item manifest")]
    Io(#[from] std::io::Error),
}

/// Configuration errors, detected before any network activity
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Two items share an identifier (entry names would collide)
    #[error("Duplicate item id in batch: {id}")]
    DuplicateItem { id: String },

    /// Item identifier cannot be used as an archive entry name
    #[error("Invalid item id '{id}': {reason}")]
    InvalidItemId { id: String, reason: String },

    /// Output directory missing and not creatable, or not a directory
    #[error("Output directory is not usable: {path}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Proxy endpoint rejected by the HTTP client
    #[error("Invalid proxy endpoint: {endpoint}")]
    InvalidProxy {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be built
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Worker pool errors
#[derive(Error, Debug)]
pub enum QueueError {
    /// Pool finished while items were still unaccounted for
    #[error("Workers terminated with {missing} item(s) unreported")]
    WorkerTerminated { missing: usize },

    /// Operation not allowed in the pool's current state
    #[error("Invalid worker pool state: {state}")]
    InvalidState { state: String },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Network failure fetching an item
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Archive write failure
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Item manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Worker pool error
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if rerunning the same batch could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(FetchError::Transport { .. }) => true,
            AppError::Fetch(FetchError::Status { status, .. }) => *status == 429 || *status >= 500,
            AppError::Archive(ArchiveError::InUse { .. }) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "network",
            AppError::Archive(_) => "archive",
            AppError::Manifest(_) => "manifest",
            AppError::Config(_) => "config",
            AppError::Queue(_) => "queue",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Archive result type alias
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
