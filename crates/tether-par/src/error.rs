//! Scheduler error types.
//!
//! Argument errors are raised before any work starts. Action failures
//! carry every failing index the scheduler observed.

/// A `parallel_for` call was made with invalid bounds or batch hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// `minimum_actions_per_thread` was zero.
    #[error("each thread must perform at least one action")]
    ZeroMinimum,
    /// The range start is greater than its end.
    #[error("start must not exceed end (start {start}, end {end})")]
    StartAfterEnd {
        /// Requested start index.
        start: usize,
        /// Requested end index (exclusive).
        end: usize,
    },
}

/// An action failed at a specific index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexFailure<E> {
    /// The index the action was invoked with.
    pub index: usize,
    /// The error the action returned.
    pub error: E,
}

/// Errors from [`parallel_for`](crate::parallel_for) and
/// [`Scheduler::run`](crate::Scheduler::run).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParallelError<E> {
    /// Arguments were rejected before any action ran.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
    /// One or more actions failed.
    ///
    /// On the sequential path this holds exactly one failure. On the
    /// batched path it holds the first failure of every failing batch,
    /// sorted by index.
    #[error("action failed at {} index(es), first at {}", .failures.len(), .failures.first().map_or(0, |f| f.index))]
    ActionFailed {
        /// Failures in ascending index order; never empty.
        failures: Vec<IndexFailure<E>>,
    },
}

impl<E> ParallelError<E> {
    /// The lowest-index action failure, if this is an action failure.
    pub fn first_failure(&self) -> Option<&IndexFailure<E>> {
        match self {
            Self::ActionFailed { failures } => failures.first(),
            Self::InvalidArgument(_) => None,
        }
    }

    /// Consume the error, returning every action failure.
    pub fn into_failures(self) -> Vec<IndexFailure<E>> {
        match self {
            Self::ActionFailed { failures } => failures,
            Self::InvalidArgument(_) => Vec::new(),
        }
    }
}
