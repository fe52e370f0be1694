//! Application constants for Media Archiver
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Proxy endpoint used when neither the CLI nor the config file sets one
    pub const PROXY: &str = "MEDIA_ARCHIVER_PROXY";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("media-archiver/", env!("CARGO_PKG_VERSION"));

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 16;

    /// Scheme prepended to plain HTTP proxy endpoints given as `host:port`
    pub const DEFAULT_PROXY_SCHEME: &str = "http://";

    /// Marker that selects the SOCKS transport for a proxy endpoint
    pub const SOCKS_MARKER: &str = "socks";
}

/// Archive output constants
pub mod archive {
    /// File extension of the produced archive
    pub const ARCHIVE_EXTENSION: &str = "zip";

    /// Suffix of the archive while it is being written
    pub const PARTIAL_SUFFIX: &str = ".part";

    /// Extension given to every archive entry unless configured otherwise
    pub const DEFAULT_ENTRY_EXTENSION: &str = "mp4";

    /// Default base name of the archive
    pub const DEFAULT_OUTPUT_NAME: &str = "media";

    /// DEFLATE compression level (maximum)
    pub const COMPRESSION_LEVEL: i64 = 9;
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of concurrent fetches
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Upper bound on the concurrency limit accepted from configuration
    pub const MAX_CONCURRENCY: usize = 64;

    /// Upper bound on the buffer pre-allocated from an advertised content length (64MB)
    pub const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;
}

/// Progress display constants
pub mod progress {
    /// Bar template, `{msg}` carries the item id
    pub const BAR_TEMPLATE: &str = "Downloading {msg} [{bar:30}] {percent}%";

    /// Glyphs for the completed and pending parts of a bar
    pub const BAR_CHARS: &str = "= ";
}

/// Configuration file discovery
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE_NAME: &str = "media-archiver.toml";

    /// Directory under the user config directory
    pub const APP_DIR_NAME: &str = "media-archiver";

    /// File name inside the user config directory
    pub const FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use archive::{DEFAULT_ENTRY_EXTENSION, DEFAULT_OUTPUT_NAME};
pub use env::PROXY as ENV_PROXY;
pub use http::USER_AGENT;
pub use workers::DEFAULT_CONCURRENCY;
