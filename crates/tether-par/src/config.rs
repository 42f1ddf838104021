//! Scheduler configuration, validation, and error types.
//!
//! [`SchedulerConfig`] is the builder-input for a [`Scheduler`](crate::Scheduler).
//! [`validate()`](SchedulerConfig::validate) checks its invariants once,
//! at construction.

use std::num::NonZeroUsize;

// ── SchedulerConfig ────────────────────────────────────────────────

/// Configuration for a [`Scheduler`](crate::Scheduler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Minimum number of indices each batch must be worth before the range
    /// is split further. Default: 1.
    pub min_actions_per_thread: usize,
    /// Number of worker threads. `None` = the process's logical processor
    /// count, dispatched on the global rayon pool. `Some(n)` builds a
    /// dedicated pool of `n` threads.
    pub worker_limit: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_actions_per_thread: 1,
            worker_limit: None,
        }
    }
}

impl SchedulerConfig {
    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroMinimum`] or [`ConfigError::ZeroWorkers`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_actions_per_thread == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if self.worker_limit == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Worker count the batch plan is sized against.
    pub fn resolved_cores(&self) -> usize {
        self.worker_limit.unwrap_or_else(available_cores)
    }
}

/// Logical processors visible to this process, at least 1.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a [`Scheduler`](crate::Scheduler).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `min_actions_per_thread` is zero.
    #[error("min_actions_per_thread must be at least 1")]
    ZeroMinimum,
    /// `worker_limit` is `Some(0)`.
    #[error("worker_limit must be at least 1 when set")]
    ZeroWorkers,
    /// The dedicated rayon pool could not be built.
    #[error("failed to build worker pool: {reason}")]
    ThreadPoolBuild {
        /// Description from the pool builder.
        reason: String,
    },
}
