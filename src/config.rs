//! Configuration management for Media Archiver
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! config file, the `MEDIA_ARCHIVER_PROXY` environment variable (proxy only,
//! and only when the file sets none), and command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ArchiverSettings, ClientConfig, ProxyConfig};
use crate::constants::{archive, config as paths, env, http, workers};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Batch and output settings
    pub download: DownloadConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfigToml {
    /// Maximum fetches in flight
    pub concurrency: usize,
    /// Directory for the archive (working directory when unset)
    pub output_dir: Option<PathBuf>,
    /// Archive base name, without extension
    pub output_name: String,
    /// Extension given to each archive entry
    pub entry_extension: String,
    /// Show per-item progress bars
    pub progress: bool,
    /// Proxy endpoint (`host:port`, `http://...`, or `socks5://...`)
    pub proxy: Option<String>,
}

impl Default for DownloadConfigToml {
    fn default() -> Self {
        Self {
            concurrency: workers::DEFAULT_CONCURRENCY,
            output_dir: None,
            output_name: archive::DEFAULT_OUTPUT_NAME.to_string(),
            entry_extension: archive::DEFAULT_ENTRY_EXTENSION.to_string(),
            progress: true,
            proxy: None,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Whole-request timeout, e.g. "30m" (unset = no limit)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    /// Connect timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// TCP keep-alive interval (unset = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout (unset = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// User agent header
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            request_timeout: client.request_timeout,
            connect_timeout: client.connect_timeout,
            tcp_keepalive: client.tcp_keepalive,
            tcp_nodelay: client.tcp_nodelay,
            pool_idle_timeout: client.pool_idle_timeout,
            pool_max_per_host: client.pool_max_per_host,
            user_agent: client.user_agent,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit file or the standard locations
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if an explicit file does not exist, or
    /// a parse/validation error if the file is malformed
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound { path }.into());
            }
            Some(path) => Some(path),
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the effective configuration
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::generic(format!("Failed to serialize configuration: {}", e)))
    }

    /// Check every value that would otherwise fail mid-batch
    pub fn validate(&self) -> ConfigResult<()> {
        let download = &self.download;
        if download.concurrency == 0 || download.concurrency > workers::MAX_CONCURRENCY {
            return Err(ConfigError::InvalidValue {
                field: "download.concurrency".to_string(),
                value: download.concurrency.to_string(),
                reason: format!("Must be between 1 and {}", workers::MAX_CONCURRENCY),
            });
        }

        if download.output_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "download.output_name".to_string(),
                value: download.output_name.clone(),
                reason: "Archive name cannot be empty".to_string(),
            });
        }

        if download.entry_extension.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "download.entry_extension".to_string(),
                value: download.entry_extension.clone(),
                reason: "Extension cannot contain path separators".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: format!("Expected one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        if self.client.request_timeout.is_some_and(|t| t.is_zero())
            || self.client.connect_timeout.is_zero()
        {
            return Err(ConfigError::InvalidValue {
                field: "client".to_string(),
                value: "0s".to_string(),
                reason: "Timeouts must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Proxy endpoint from the file, falling back to the environment
    pub fn proxy_endpoint(&self) -> Option<String> {
        resolve_proxy(self.download.proxy.as_deref(), std::env::var(env::PROXY).ok())
    }

    /// Convert to the settings the archiver runs with
    pub fn to_archiver_settings(&self) -> ArchiverSettings {
        let proxy = ProxyConfig::from_endpoint(self.proxy_endpoint().as_deref());
        ArchiverSettings {
            client: self.client.to_runtime_config(proxy),
            progress: self.download.progress,
            entry_extension: self.download.entry_extension.clone(),
        }
    }

    /// Write a commented default configuration file
    ///
    /// Writes to `path`, or to the user config location when `None`. An
    /// existing file is only replaced when `force` is set.
    pub async fn initialize(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(AppError::generic(format!(
                "Configuration file already exists: {} (use --force to overwrite)",
                config_path.display()
            )));
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&config_path, Self::default_config_content()).await?;
        info!("Wrote default configuration to {}", config_path.display());
        Ok(config_path)
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(paths::LOCAL_FILE_NAME)];
        if let Ok(user_path) = Self::default_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join(paths::APP_DIR_NAME).join(paths::FILE_NAME))
    }

    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Default configuration content with comments
    pub fn default_config_content() -> String {
        format!(
            r#"# Media Archiver Configuration
# Command-line flags override anything set here.

[download]
# Maximum number of fetches in flight (1-{max})
concurrency = {concurrency}

# Directory for the archive (working directory when unset)
# output_dir = "/path/to/archives"

# Archive base name; the archive is written to <output_name>.zip
output_name = "{name}"

# Extension given to each archive entry (<id>.<extension>)
entry_extension = "{extension}"

# Show per-item progress bars
progress = true

# Proxy for all fetches. Endpoints containing "socks" use SOCKS,
# anything else is treated as an HTTP proxy.
# Falls back to the {proxy_env} environment variable.
# proxy = "127.0.0.1:8080"

[client]
# Cap on a whole transfer, body included (unset = no limit)
# request_timeout = "30m"
connect_timeout = "{connect_timeout}"
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = {pool_max}

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            max = workers::MAX_CONCURRENCY,
            concurrency = workers::DEFAULT_CONCURRENCY,
            name = archive::DEFAULT_OUTPUT_NAME,
            extension = archive::DEFAULT_ENTRY_EXTENSION,
            proxy_env = env::PROXY,
            connect_timeout = humantime_serde::re::humantime::format_duration(http::CONNECT_TIMEOUT),
            pool_max = http::POOL_MAX_PER_HOST,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self, proxy: ProxyConfig) -> ClientConfig {
        ClientConfig {
            proxy,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            tcp_keepalive: self.tcp_keepalive,
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_per_host: self.pool_max_per_host,
            user_agent: self.user_agent.clone(),
        }
    }
}

fn resolve_proxy(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .filter(|endpoint| !endpoint.trim().is_empty())
        .or_else(|| from_env.filter(|endpoint| !endpoint.trim().is_empty()))
}
