//! Multi-item progress reporting
//!
//! The aggregator owns one indicator per in-flight item, all rendered together
//! through an indicatif `MultiProgress`. Progress is cosmetic: nothing here
//! returns an error to the caller, and rendering problems are logged and
//! dropped.

use std::sync::{Mutex, MutexGuard};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

use crate::constants::progress;

/// Handle to one item's indicator
///
/// Each fetch owns exactly one handle and is the only code advancing it.
#[derive(Debug, Clone)]
pub struct IndicatorHandle {
    bar: ProgressBar,
}

impl IndicatorHandle {
    /// Bytes reported so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Declared capacity (advertised content length)
    pub fn capacity(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }
}

/// Point-in-time view of one indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSnapshot {
    pub label: String,
    pub position: u64,
    pub capacity: u64,
}

/// Collection of per-item progress indicators
#[derive(Debug)]
pub struct ProgressAggregator {
    multi: MultiProgress,
    indicators: Mutex<Vec<IndicatorHandle>>,
    enabled: bool,
}

impl ProgressAggregator {
    /// Create an aggregator drawing to stderr
    ///
    /// When `enabled` is false no indicators are created at all. When stderr is
    /// not a terminal indicators are still tracked but never drawn.
    pub fn new(enabled: bool) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let target = if is_terminal {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self::with_draw_target(enabled, target)
    }

    /// Aggregator that tracks indicators without drawing them
    pub fn hidden() -> Self {
        Self::with_draw_target(true, ProgressDrawTarget::hidden())
    }

    /// Aggregator with progress reporting turned off
    pub fn disabled() -> Self {
        Self::with_draw_target(false, ProgressDrawTarget::hidden())
    }

    fn with_draw_target(enabled: bool, target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            indicators: Mutex::new(Vec::new()),
            enabled,
        }
    }

    /// Whether indicators are created
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register a new indicator of the given capacity
    ///
    /// Returns `None` when progress reporting is disabled.
    pub fn create_indicator(&self, capacity: u64, label: &str) -> Option<IndicatorHandle> {
        if !self.enabled {
            return None;
        }

        let bar = self.multi.add(ProgressBar::new(capacity));
        bar.set_style(Self::bar_style());
        bar.set_message(label.to_string());

        let handle = IndicatorHandle { bar };
        self.lock_indicators().push(handle.clone());
        Some(handle)
    }

    /// Advance an indicator by `delta` bytes
    ///
    /// Advancing past the declared capacity is accepted; advertised lengths
    /// can be wrong.
    pub fn advance(&self, handle: &IndicatorHandle, delta: u64, label: &str) {
        if handle.bar.message() != label {
            handle.bar.set_message(label.to_string());
        }
        handle.bar.inc(delta);
    }

    /// Number of indicators created in this batch
    pub fn indicator_count(&self) -> usize {
        self.lock_indicators().len()
    }

    /// Current state of every indicator, in creation order
    pub fn snapshot(&self) -> Vec<IndicatorSnapshot> {
        self.lock_indicators()
            .iter()
            .map(|handle| IndicatorSnapshot {
                label: handle.bar.message(),
                position: handle.position(),
                capacity: handle.capacity(),
            })
            .collect()
    }

    /// Remove all bars from the terminal
    pub fn clear(&self) {
        for handle in self.lock_indicators().iter() {
            handle.bar.finish_and_clear();
        }
        if let Err(e) = self.multi.clear() {
            debug!("Failed to clear progress display: {}", e);
        }
    }

    fn bar_style() -> ProgressStyle {
        match ProgressStyle::with_template(progress::BAR_TEMPLATE) {
            Ok(style) => style.progress_chars(progress::BAR_CHARS),
            Err(e) => {
                debug!("Progress bar template error, using default style: {}", e);
                ProgressStyle::default_bar()
            }
        }
    }

    // A panic while holding the lock leaves the list intact, so poisoning is ignored
    fn lock_indicators(&self) -> MutexGuard<'_, Vec<IndicatorHandle>> {
        self.indicators
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new(true)
    }
}
