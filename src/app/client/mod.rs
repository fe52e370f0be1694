//! HTTP retrieval of batch items
//!
//! The module is organized into:
//! - `config`: proxy selection and HTTP client building
//! - `fetch`: the `Fetch` seam and the streaming `ResourceFetcher`

pub mod config;
pub mod fetch;

pub use config::{ClientConfig, ProxyConfig};
pub use fetch::{Fetch, ResourceFetcher, TransferState};
