//! Worker type definitions
//!
//! Data exchanged between fetch workers and the archiving consumer.

use crate::app::models::Item;
use crate::errors::FetchResult;

/// Result of one item's fetch, sent from a worker to the archiver
#[derive(Debug)]
pub struct WorkerOutcome {
    /// ID of the worker that handled the item
    pub worker_id: u32,
    /// Item that was fetched
    pub item: Item,
    /// Fetched bytes, or the failure cause
    pub result: FetchResult<Vec<u8>>,
}

impl WorkerOutcome {
    /// Whether the fetch succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Current state of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Pool has been created but not started
    Created,
    /// Workers have been spawned
    Running,
    /// Pool handles released; in-flight workers finish unobserved
    Detached,
}

impl std::fmt::Display for PoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PoolState::Created => "created",
            PoolState::Running => "running",
            PoolState::Detached => "detached",
        };
        write!(f, "{}", name)
    }
}
