//! Batch partitioning for index ranges.
//!
//! A [`BatchPlan`] decides how `[start, end)` is split: one sequential run
//! on the calling thread, or up to `cores` contiguous batches of equal
//! size (the last one possibly shorter). Plans are pure values, computed
//! once per call and never mutated.

use std::ops::Range;

use crate::error::ArgumentError;

/// How an index range is partitioned into batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct BatchPlan {
    start: usize,
    end: usize,
    num_batches: usize,
    batch_size: usize,
}

impl BatchPlan {
    /// Partition `[start, end)` for `cores` workers.
    ///
    /// `max_batches = ceil(count / min_per_thread)`,
    /// `num_batches = min(max_batches, cores)`, and
    /// `batch_size = ceil(count / num_batches)`. A `cores` of zero is
    /// treated as one.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::ZeroMinimum`] if `min_per_thread == 0`, and
    /// [`ArgumentError::StartAfterEnd`] if `start > end`.
    pub fn compute(
        start: usize,
        end: usize,
        min_per_thread: usize,
        cores: usize,
    ) -> Result<Self, ArgumentError> {
        if min_per_thread == 0 {
            return Err(ArgumentError::ZeroMinimum);
        }
        if start > end {
            return Err(ArgumentError::StartAfterEnd { start, end });
        }
        let count = end - start;
        let max_batches = count.div_ceil(min_per_thread);
        let num_batches = max_batches.min(cores.max(1));
        let batch_size = if num_batches == 0 {
            0
        } else {
            count.div_ceil(num_batches)
        };
        Ok(Self {
            start,
            end,
            num_batches,
            batch_size,
        })
    }

    /// First index of the range.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last index of the range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of indices in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of planned batches (zero for an empty range).
    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    /// Indices per batch; the final batch may be shorter or empty.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether the plan runs on the calling thread without dispatch.
    pub fn is_sequential(&self) -> bool {
        self.num_batches <= 1
    }

    /// Index range of batch `i`. Empty when `i` lies past the last
    /// non-empty batch.
    pub fn batch(&self, i: usize) -> Range<usize> {
        let count = self.len();
        let low = self.start + i.saturating_mul(self.batch_size).min(count);
        let high = self.start + i.saturating_add(1).saturating_mul(self.batch_size).min(count);
        low..high
    }

    /// Non-empty batch ranges in ascending order.
    ///
    /// Together they cover `[start, end)` exactly once.
    pub fn batches(&self) -> impl Iterator<Item = Range<usize>> {
        let plan = *self;
        (0..plan.num_batches)
            .map(move |i| plan.batch(i))
            .filter(|range| !range.is_empty())
    }
}
