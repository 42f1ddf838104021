//! Batched parallel-for execution.
//!
//! [`parallel_for`] runs an action for every index of a range. Small
//! ranges (or a single core) run sequentially on the calling thread;
//! otherwise the range is split by [`BatchPlan`] and the batches are
//! fanned out on rayon. Either way the call blocks until every index has
//! been processed or its batch has failed.
//!
//! # Failure policy
//!
//! Each batch stops at its own first failing index. The batches are
//! independent, so every other batch still runs to completion. All
//! failures are collected and returned together, sorted by index.

use std::convert::Infallible;
use std::ops::Range;

use rayon::prelude::*;

use crate::config::{available_cores, ConfigError, SchedulerConfig};
use crate::error::{ArgumentError, IndexFailure, ParallelError};
use crate::plan::BatchPlan;

/// Run `action` for every index in `[start, end)`.
///
/// The range is split into at most `min(ceil(count / min_per_thread), cores)`
/// batches, where `cores` is the number of logical processors. Indices
/// within a batch run in increasing order; batches run concurrently in
/// unspecified order. The action must tolerate concurrent calls with
/// distinct indices.
///
/// # Errors
///
/// [`ParallelError::InvalidArgument`] before any action runs if
/// `min_per_thread == 0` or `start > end`; [`ParallelError::ActionFailed`]
/// after all batches finish if any action failed.
pub fn parallel_for<F, E>(
    start: usize,
    end: usize,
    min_per_thread: usize,
    action: F,
) -> Result<(), ParallelError<E>>
where
    F: Fn(usize) -> Result<(), E> + Sync,
    E: Send,
{
    let plan = BatchPlan::compute(start, end, min_per_thread, available_cores())?;
    execute(&plan, &action)
}

/// [`parallel_for`] with an infallible action and one index per thread
/// minimum.
///
/// # Errors
///
/// Only [`ParallelError::InvalidArgument`], when `start > end`.
pub fn parallel_for_each<F>(
    start: usize,
    end: usize,
    action: F,
) -> Result<(), ParallelError<Infallible>>
where
    F: Fn(usize) + Sync,
{
    parallel_for(start, end, 1, |index| {
        action(index);
        Ok(())
    })
}

/// A configured parallel-for runner.
///
/// With a [`worker_limit`](SchedulerConfig::worker_limit), batches run on a
/// dedicated rayon pool of that size; otherwise on the global pool.
pub struct Scheduler {
    config: SchedulerConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Scheduler {
    /// Validate `config` and build the worker pool if one is requested.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from validation or pool construction.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pool = match config.worker_limit {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("tether-par-{i}"))
                    .build()
                    .map_err(|e| ConfigError::ThreadPoolBuild {
                        reason: e.to_string(),
                    })?,
            ),
            None => None,
        };
        Ok(Self { config, pool })
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The batch plan [`run`](Self::run) would use for `[start, end)`.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::StartAfterEnd`] if `start > end`.
    pub fn plan(&self, start: usize, end: usize) -> Result<BatchPlan, ArgumentError> {
        BatchPlan::compute(
            start,
            end,
            self.config.min_actions_per_thread,
            self.config.resolved_cores(),
        )
    }

    /// Run `action` for every index in `[start, end)`.
    ///
    /// Same ordering and failure semantics as [`parallel_for`], using the
    /// configured minimum and worker count.
    ///
    /// # Errors
    ///
    /// See [`parallel_for`].
    pub fn run<F, E>(&self, start: usize, end: usize, action: F) -> Result<(), ParallelError<E>>
    where
        F: Fn(usize) -> Result<(), E> + Sync,
        E: Send,
    {
        let plan = self.plan(start, end)?;
        match &self.pool {
            Some(pool) if !plan.is_sequential() => pool.install(|| execute(&plan, &action)),
            _ => execute(&plan, &action),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            config: SchedulerConfig::default(),
            pool: None,
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

/// Execute a validated plan on the current rayon pool.
fn execute<F, E>(plan: &BatchPlan, action: &F) -> Result<(), ParallelError<E>>
where
    F: Fn(usize) -> Result<(), E> + Sync,
    E: Send,
{
    if plan.is_empty() {
        return Ok(());
    }

    if plan.is_sequential() {
        tracing::debug!(count = plan.len(), "running range sequentially");
        return run_batch(plan.start()..plan.end(), action).map_err(|failure| {
            ParallelError::ActionFailed {
                failures: vec![failure],
            }
        });
    }

    tracing::debug!(
        count = plan.len(),
        num_batches = plan.num_batches(),
        batch_size = plan.batch_size(),
        "running range in parallel batches"
    );

    let mut failures: Vec<IndexFailure<E>> = (0..plan.num_batches())
        .into_par_iter()
        .filter_map(|i| run_batch(plan.batch(i), action).err())
        .collect();

    if failures.is_empty() {
        return Ok(());
    }
    failures.sort_by_key(|failure| failure.index);
    tracing::debug!(
        failed_batches = failures.len(),
        num_batches = plan.num_batches(),
        "parallel batches reported failures"
    );
    Err(ParallelError::ActionFailed { failures })
}

/// Run one batch in increasing index order, stopping at the first failure.
fn run_batch<F, E>(range: Range<usize>, action: &F) -> Result<(), IndexFailure<E>>
where
    F: Fn(usize) -> Result<(), E>,
{
    for index in range {
        action(index).map_err(|error| IndexFailure { index, error })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn scheduler(workers: usize, min: usize) -> Scheduler {
        Scheduler::new(SchedulerConfig {
            min_actions_per_thread: min,
            worker_limit: Some(workers),
        })
        .unwrap()
    }

    #[test]
    fn empty_range_is_noop() {
        let calls = AtomicUsize::new(0);
        parallel_for(5, 5, 1, |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn zero_minimum_is_invalid() {
        let result = parallel_for(0, 10, 0, |_| Ok::<(), ()>(()));
        assert_eq!(
            result,
            Err(ParallelError::InvalidArgument(ArgumentError::ZeroMinimum))
        );
    }

    #[test]
    fn start_after_end_is_invalid() {
        let result = parallel_for_each(10, 0, |_| {});
        assert!(matches!(
            result,
            Err(ParallelError::InvalidArgument(
                ArgumentError::StartAfterEnd { .. }
            ))
        ));
    }

    #[test]
    fn invalid_arguments_run_nothing() {
        let calls = AtomicUsize::new(0);
        let _ = parallel_for(0, 10, 0, |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<(), ()>(())
        });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn sequential_path_runs_in_order_on_caller() {
        let seen = Mutex::new(Vec::new());
        let caller = std::thread::current().id();
        parallel_for(0, 3, 100, |i| {
            assert_eq!(std::thread::current().id(), caller);
            seen.lock().unwrap().push(i);
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(seen.into_inner().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn sequential_failure_stops_immediately() {
        let calls = AtomicUsize::new(0);
        let result = scheduler(1, 1).run(0, 10, |i| {
            calls.fetch_add(1, Ordering::Relaxed);
            if i == 4 {
                Err("boom")
            } else {
                Ok(())
            }
        });
        assert_eq!(calls.load(Ordering::Relaxed), 5);
        assert_eq!(
            result,
            Err(ParallelError::ActionFailed {
                failures: vec![IndexFailure {
                    index: 4,
                    error: "boom"
                }]
            })
        );
    }

    #[test]
    fn every_index_runs_once_in_batches() {
        let hits: Vec<AtomicUsize> = (0..20).map(|_| AtomicUsize::new(0)).collect();
        scheduler(8, 1)
            .run(0, 20, |i| {
                hits[i].fetch_add(1, Ordering::Relaxed);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn failures_from_several_batches_are_aggregated() {
        // 8 workers over [0, 40): batches of 5.
        let result = scheduler(8, 1).run(0, 40, |i| {
            if i == 7 || i == 8 || i == 31 {
                Err(i)
            } else {
                Ok(())
            }
        });
        let failures = result.unwrap_err().into_failures();
        // 7 and 8 share the batch [5, 10), which stops at 7.
        let indices: Vec<_> = failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![7, 31]);
        assert_eq!(failures[1].error, 31);
    }

    #[test]
    fn failing_batch_does_not_stop_others() {
        let done = AtomicUsize::new(0);
        let result = scheduler(4, 1).run(0, 400, |i| {
            if i == 0 {
                return Err(());
            }
            done.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
        assert!(result.is_err());
        // Batch [0, 100) stops at its first index; the other three finish.
        assert_eq!(done.load(Ordering::Relaxed), 300);
    }

    #[test]
    fn plan_reflects_config() {
        let plan = scheduler(8, 1).plan(0, 20).unwrap();
        assert_eq!(plan.num_batches(), 8);
        assert_eq!(plan.batch_size(), 3);
    }

    #[test]
    fn zero_worker_config_is_rejected() {
        let err = Scheduler::new(SchedulerConfig {
            min_actions_per_thread: 1,
            worker_limit: Some(0),
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroWorkers);
    }

    #[test]
    fn default_scheduler_uses_global_pool() {
        let scheduler = Scheduler::default();
        assert!(format!("{scheduler:?}").contains("dedicated_pool: false"));
        let sum = AtomicUsize::new(0);
        scheduler
            .run(0, 1000, |i| {
                sum.fetch_add(i, Ordering::Relaxed);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(sum.load(Ordering::Relaxed), 999 * 1000 / 2);
    }

    /// Records the level of every event emitted on the current thread.
    struct LevelRecorder {
        levels: std::sync::Arc<Mutex<Vec<tracing::Level>>>,
    }

    impl tracing::Subscriber for LevelRecorder {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }
        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            self.levels.lock().unwrap().push(*event.metadata().level());
        }
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[test]
    fn returned_failures_are_only_logged_at_debug() {
        let levels = std::sync::Arc::new(Mutex::new(Vec::new()));
        let recorder = LevelRecorder {
            levels: std::sync::Arc::clone(&levels),
        };
        let result = tracing::subscriber::with_default(recorder, || {
            parallel_for(0, 100, 1, |i| if i % 10 == 0 { Err(i) } else { Ok(()) })
        });
        assert!(result.is_err());

        let levels = levels.lock().unwrap();
        assert!(levels.contains(&tracing::Level::DEBUG));
        assert!(!levels.contains(&tracing::Level::WARN));
        assert!(!levels.contains(&tracing::Level::ERROR));
    }
}
