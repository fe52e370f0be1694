//! Fetch worker system
//!
//! A fixed number of workers draw items from a shared [`WorkQueue`] and send
//! each fetch outcome to a single consumer over a bounded channel. The queue's
//! close flag stops admission after the first failure; dropping the receiving
//! end stops delivery.
//!
//! # Module Organization
//!
//! - [`types`] - Outcome and pool state types
//! - [`core`] - Individual worker loop
//! - [`pool`] - Worker pool lifecycle
//!
//! [`WorkQueue`]: crate::app::queue::WorkQueue

pub mod core;
pub mod pool;
pub mod types;

pub use core::FetchWorker;
pub use pool::WorkerPool;
pub use types::{PoolState, WorkerOutcome};
