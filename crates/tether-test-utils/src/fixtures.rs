//! Reusable action and data fixtures.
//!
//! - [`IndexRecorder`]: records every index an action is called with.
//! - [`FailAt`]: fails deterministically at a fixed set of indices.
//! - [`Particle`]: a multi-field `#[repr(C)]` record for projecting
//!   references into.

use std::collections::{BTreeSet, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::ThreadId;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// One recorded call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visit {
    pub index: usize,
    /// Global call order across all threads.
    pub sequence: usize,
    pub thread: ThreadId,
}

/// Records indices from any number of threads.
///
/// Share it by reference with the action under test, then call
/// [`finish`](IndexRecorder::finish) to collect the visits.
pub struct IndexRecorder {
    tx: Sender<Visit>,
    rx: Receiver<Visit>,
    sequence: AtomicUsize,
}

impl IndexRecorder {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            sequence: AtomicUsize::new(0),
        }
    }

    /// Record a call for `index` on the current thread.
    pub fn record(&self, index: usize) {
        let visit = Visit {
            index,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            thread: std::thread::current().id(),
        };
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(visit);
    }

    /// Drain all recorded visits, ordered by call sequence.
    pub fn finish(self) -> Recording {
        drop(self.tx);
        let mut visits: Vec<Visit> = self.rx.iter().collect();
        visits.sort_by_key(|v| v.sequence);
        Recording { visits }
    }
}

impl Default for IndexRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Visits collected by an [`IndexRecorder`].
#[derive(Clone, Debug)]
pub struct Recording {
    pub visits: Vec<Visit>,
}

impl Recording {
    /// Indices in call order.
    pub fn indices(&self) -> Vec<usize> {
        self.visits.iter().map(|v| v.index).collect()
    }

    /// Whether every index in `range` was visited exactly once and nothing
    /// else was visited.
    pub fn covers_exactly(&self, range: Range<usize>) -> bool {
        let mut sorted = self.indices();
        sorted.sort_unstable();
        sorted == range.collect::<Vec<_>>()
    }

    /// Whether the indices inside `batch` were visited in increasing order.
    pub fn increasing_within(&self, batch: Range<usize>) -> bool {
        let inside: Vec<usize> = self
            .visits
            .iter()
            .filter(|v| batch.contains(&v.index))
            .map(|v| v.index)
            .collect();
        inside.windows(2).all(|w| w[0] < w[1])
    }

    /// Number of distinct threads that made calls.
    pub fn thread_count(&self) -> usize {
        self.visits
            .iter()
            .map(|v| v.thread)
            .collect::<HashSet<ThreadId>>()
            .len()
    }
}

/// Error produced by [`FailAt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixtureError(pub usize);

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fixture failure at index {}", self.0)
    }
}

impl std::error::Error for FixtureError {}

/// Fails at a fixed set of indices and succeeds everywhere else.
#[derive(Clone, Debug, Default)]
pub struct FailAt {
    indices: BTreeSet<usize>,
}

impl FailAt {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }

    /// The action body: `Err` for configured indices.
    pub fn check(&self, index: usize) -> Result<(), FixtureError> {
        if self.indices.contains(&index) {
            Err(FixtureError(index))
        } else {
            Ok(())
        }
    }
}

/// A plain multi-field record with a stable layout.
#[derive(Clone, Debug, PartialEq)]
#[repr(C)]
pub struct Particle {
    pub position: [f32; 3],
    pub mass: f64,
    pub id: u32,
}

impl Particle {
    pub fn new(id: u32) -> Self {
        Self {
            position: [id as f32, 0.0, 0.0],
            mass: 1.0 + f64::from(id),
            id,
        }
    }
}

/// `count` particles with ids `0..count`.
pub fn particles(count: u32) -> Vec<Particle> {
    (0..count).map(Particle::new).collect()
}
