//! Streaming fetch of a single resource into memory
//!
//! A fetch registers a progress indicator once the response headers advertise
//! a content length, then accumulates the body chunk by chunk.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::app::models::Item;
use crate::app::progress::ProgressAggregator;
use crate::constants::workers;
use crate::errors::{ConfigResult, FetchError, FetchResult};

use super::config::ClientConfig;

/// Retrieves one item fully into memory
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the item's bytes
    async fn fetch(&self, item: &Item) -> FetchResult<Vec<u8>>;
}

/// Per-item transfer bookkeeping
#[derive(Debug)]
pub struct TransferState {
    total_bytes: Option<u64>,
    received_bytes: u64,
    buffer: Vec<u8>,
}

impl TransferState {
    /// Start a transfer; the buffer is pre-sized from the advertised length
    pub fn new(total_bytes: Option<u64>) -> Self {
        let capacity = total_bytes
            .map(|total| usize::try_from(total).unwrap_or(usize::MAX))
            .unwrap_or(0)
            .min(workers::MAX_PREALLOCATION);

        Self {
            total_bytes,
            received_bytes: 0,
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append one received chunk
    pub fn record_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        self.received_bytes += chunk.len() as u64;
    }

    /// Advertised length, if the server sent one
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Bytes received so far
    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    /// Hand the accumulated bytes off
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}

/// HTTP fetcher shared by all workers of a batch
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    client: Client,
    progress: Arc<ProgressAggregator>,
}

impl ResourceFetcher {
    /// Build a fetcher from client configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the proxy endpoint or client settings are invalid
    pub fn new(config: &ClientConfig, progress: Arc<ProgressAggregator>) -> ConfigResult<Self> {
        let client = config.build_http_client()?;
        Ok(Self::with_client(client, progress))
    }

    /// Wrap an existing HTTP client
    pub fn with_client(client: Client, progress: Arc<ProgressAggregator>) -> Self {
        Self { client, progress }
    }

    /// Progress aggregator receiving this fetcher's indicators
    pub fn progress(&self) -> &Arc<ProgressAggregator> {
        &self.progress
    }

    fn transport_error(item: &Item, source: reqwest::Error) -> FetchError {
        FetchError::Transport {
            id: item.id.clone(),
            url: item.source_url.clone(),
            source,
        }
    }
}

#[async_trait]
impl Fetch for ResourceFetcher {
    async fn fetch(&self, item: &Item) -> FetchResult<Vec<u8>> {
        let url = Url::parse(&item.source_url).map_err(|e| FetchError::InvalidUrl {
            id: item.id.clone(),
            url: item.source_url.clone(),
            reason: e.to_string(),
        })?;

        debug!("Fetching '{}' from {}", item.id, url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(item, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id: item.id.clone(),
                url: item.source_url.clone(),
                status: status.as_u16(),
            });
        }

        let total_bytes = response.content_length();
        let indicator =
            total_bytes.and_then(|total| self.progress.create_indicator(total, &item.id));
        let mut state = TransferState::new(total_bytes);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::transport_error(item, e))?;
            state.record_chunk(&chunk);
            if let Some(indicator) = &indicator {
                self.progress
                    .advance(indicator, chunk.len() as u64, &item.id);
            }
        }

        debug!(
            "Fetched '{}': {} bytes (advertised {:?})",
            item.id,
            state.received_bytes(),
            state.total_bytes()
        );
        Ok(state.into_buffer())
    }
}
