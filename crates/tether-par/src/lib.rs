//! Batched parallel-for scheduling over index ranges.
//!
//! [`parallel_for`] partitions `[start, end)` into contiguous batches and
//! runs them across the available processors, but only when the range is
//! large enough to be worth it; otherwise it loops on the calling thread.
//!
//! # Batch sizing
//!
//! ```text
//! count       = end - start
//! max_batches = ceil(count / min_actions_per_thread)
//! num_batches = min(max_batches, cores)
//! batch_size  = ceil(count / num_batches)      (num_batches > 1 only)
//! ```
//!
//! Batches are dispatched through rayon's fan-out/fan-in; the call
//! returns once every batch has finished.
//!
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use tether_par::parallel_for;
//!
//! let total = AtomicU64::new(0);
//! parallel_for(0, 1_000, 64, |i| {
//!     total.fetch_add(i as u64, Ordering::Relaxed);
//!     Ok::<(), std::convert::Infallible>(())
//! })
//! .unwrap();
//! assert_eq!(total.into_inner(), 499_500);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod plan;
pub mod scheduler;

pub use config::{available_cores, ConfigError, SchedulerConfig};
pub use error::{ArgumentError, IndexFailure, ParallelError};
pub use plan::BatchPlan;
pub use scheduler::{parallel_for, parallel_for_each, Scheduler};
