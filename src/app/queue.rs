//! Work queue feeding the worker pool
//!
//! Items are admitted strictly in the order they were supplied. Once the queue
//! is closed (first failure in a batch) no further items are handed out, while
//! items already admitted keep running.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

use crate::app::models::Item;

/// Snapshot of queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items supplied when the queue was built
    pub total: usize,
    /// Items handed to a worker so far
    pub admitted: usize,
    /// Items still waiting for a slot
    pub pending: usize,
    /// Whether admission has been stopped
    pub closed: bool,
}

/// FIFO queue of items with a close flag
#[derive(Debug)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<Item>>,
    closed: AtomicBool,
    admitted: AtomicUsize,
    total: usize,
}

impl WorkQueue {
    /// Create a queue holding the given items in order
    pub fn new(items: Vec<Item>) -> Self {
        let total = items.len();
        Self {
            pending: Mutex::new(items.into()),
            closed: AtomicBool::new(false),
            admitted: AtomicUsize::new(0),
            total,
        }
    }

    /// Take the next item, or `None` when drained or closed
    pub async fn next_item(&self) -> Option<Item> {
        let mut pending = self.pending.lock().await;
        if self.closed.load(Ordering::Acquire) {
            return None;
        }

        let item = pending.pop_front()?;
        self.admitted.fetch_add(1, Ordering::AcqRel);
        Some(item)
    }

    /// Stop admitting items
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Work queue closed, no further items will be admitted");
        }
    }

    /// Whether admission has been stopped
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Total number of items the queue was built with
    pub fn total(&self) -> usize {
        self.total
    }

    /// Current queue counters
    pub async fn stats(&self) -> QueueStats {
        let pending = self.pending.lock().await.len();
        QueueStats {
            total: self.total,
            admitted: self.admitted.load(Ordering::Acquire),
            pending,
            closed: self.is_closed(),
        }
    }
}
