//! HTTP client configuration and building logic
//!
//! This module handles proxy selection and the construction of the single
//! `reqwest::Client` shared by every fetch in a batch.

use std::time::Duration;

use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{ConfigError, ConfigResult};

/// Proxy used for every fetch of a batch
///
/// Chosen once at configuration time; at most one transport is active.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "endpoint", rename_all = "lowercase")]
pub enum ProxyConfig {
    /// Direct connection
    #[default]
    None,
    /// Plain HTTP proxy (`host:port` or full URL)
    Http(String),
    /// SOCKS proxy (`socks5://host:port`, `socks5h://...`)
    Socks(String),
}

impl ProxyConfig {
    /// Select the proxy transport from an endpoint string
    ///
    /// No endpoint (or a blank one) means a direct connection. An endpoint
    /// mentioning `socks` selects the SOCKS transport, anything else is
    /// treated as a plain HTTP proxy.
    pub fn from_endpoint(endpoint: Option<&str>) -> Self {
        match endpoint.map(str::trim) {
            None | Some("") => ProxyConfig::None,
            Some(endpoint) if endpoint.contains(http::SOCKS_MARKER) => {
                ProxyConfig::Socks(endpoint.to_string())
            }
            Some(endpoint) => ProxyConfig::Http(endpoint.to_string()),
        }
    }

    /// Endpoint as configured, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProxyConfig::None => None,
            ProxyConfig::Http(endpoint) | ProxyConfig::Socks(endpoint) => Some(endpoint),
        }
    }

    /// Proxy URL handed to the HTTP client
    pub fn proxy_url(&self) -> Option<String> {
        match self {
            ProxyConfig::None => None,
            ProxyConfig::Http(endpoint) if !endpoint.contains("://") => Some(format!(
                "{}{}/",
                http::DEFAULT_PROXY_SCHEME,
                endpoint.trim_end_matches('/')
            )),
            ProxyConfig::Http(endpoint) | ProxyConfig::Socks(endpoint) => Some(endpoint.clone()),
        }
    }

    /// Short name for log output
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyConfig::None => "direct",
            ProxyConfig::Http(_) => "http",
            ProxyConfig::Socks(_) => "socks",
        }
    }

    fn to_reqwest(&self) -> ConfigResult<Option<Proxy>> {
        let Some(url) = self.proxy_url() else {
            return Ok(None);
        };

        Proxy::all(&url)
            .map(Some)
            .map_err(|source| ConfigError::InvalidProxy {
                endpoint: url,
                source,
            })
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Proxy applied to every request
    pub proxy: ProxyConfig,
    /// Whole-request timeout, body included (unset = no limit)
    pub request_timeout: Option<Duration>,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// User agent header
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::None,
            request_timeout: None,
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidProxy` if the proxy endpoint is rejected,
    /// or `ConfigError::Client` if the client cannot be built
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        let mut client_builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        // Large media can take arbitrarily long; only cap the transfer when asked
        if let Some(timeout) = self.request_timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        // Only the configured proxy is used; system proxy variables are ignored
        client_builder = match self.proxy.to_reqwest()? {
            Some(proxy) => client_builder.proxy(proxy),
            None => client_builder.no_proxy(),
        };

        tracing::debug!("Building HTTP client ({} transport)", self.proxy.kind());
        client_builder.build().map_err(ConfigError::Client)
    }
}
