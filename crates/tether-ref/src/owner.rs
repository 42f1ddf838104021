//! Relocatable owners that anchored references point into.
//!
//! An [`Owner`] wraps a [`Storage`] value behind a reader/writer lock and
//! is shared as [`SharedOwner`] (`Arc<Owner<S>>`). The lock is the
//! synchronization point between dereferences and relocation: a reference
//! resolves its address while holding a read lock, and the owner only
//! moves its storage while holding the write lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::raw;
use crate::storage::Storage;

/// Storage whose address may change while references into it stay valid.
///
/// Mutation is limited to the target region ([`write`](Self::write)) and to
/// grow-only operations, so offsets taken against the target never fall
/// out of bounds. Relocation happens explicitly through
/// [`relocate`](Self::relocate), or implicitly when a `Vec`-backed owner
/// outgrows its capacity.
///
/// The lock is not reentrant: holding a guard returned by [`write`](Self::write)
/// (or a mutable reference guard) while dereferencing another reference into
/// the same owner on the same thread deadlocks.
pub struct Owner<S> {
    storage: RwLock<S>,
    /// Number of times the target region has moved.
    relocations: AtomicU64,
}

/// Shared owner handle; anchored references hold one to keep the owner alive.
pub type SharedOwner<S> = Arc<Owner<S>>;

impl<S: Storage> Owner<S> {
    /// Wrap `storage` in a new owner.
    pub fn new(storage: S) -> Self {
        Self {
            storage: RwLock::new(storage),
            relocations: AtomicU64::new(0),
        }
    }

    /// Wrap this owner in an `Arc` for sharing with references.
    pub fn into_shared(self) -> SharedOwner<S> {
        Arc::new(self)
    }

    /// Shared access to the target region.
    ///
    /// Never queues behind a pending relocation, so it may be called while
    /// the same thread holds a dereference guard.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, S::Target> {
        RwLockReadGuard::map(self.storage.read_recursive(), |s| s.target())
    }

    /// Exclusive access to the target region.
    ///
    /// The region can be modified in place but not resized.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, S::Target> {
        RwLockWriteGuard::map(self.storage.write(), |s| s.target_mut())
    }

    /// Move the target region to a fresh allocation.
    ///
    /// Blocks until every outstanding dereference guard is released.
    pub fn relocate(&self) {
        let mut storage = self.storage.write();
        let before = raw::origin(storage.target()).addr();
        storage.relocate();
        let after = raw::origin(storage.target()).addr();
        self.note_move(before, after);
    }

    /// Number of times the target region has moved so far.
    pub fn relocations(&self) -> u64 {
        self.relocations.load(Ordering::Acquire)
    }

    /// Current address of the target region's first byte.
    ///
    /// Only meaningful for diagnostics: the value may be stale as soon as
    /// it is returned.
    pub fn origin(&self) -> usize {
        raw::origin(self.storage.read_recursive().target()).addr()
    }

    /// Size of the target region in bytes.
    pub fn extent(&self) -> usize {
        std::mem::size_of_val(self.storage.read_recursive().target())
    }

    pub(crate) fn storage(&self) -> &RwLock<S> {
        &self.storage
    }

    fn note_move(&self, before: usize, after: usize) {
        if before == after {
            return;
        }
        let count = self.relocations.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(
            from = format_args!("{before:#x}"),
            to = format_args!("{after:#x}"),
            relocations = count,
            "owner storage relocated"
        );
    }
}

impl<T> Owner<Box<T>> {
    /// Box `value` and wrap it in a new owner.
    pub fn boxed(value: T) -> Self {
        Self::new(Box::new(value))
    }
}

impl<T> Owner<Vec<T>> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.storage.read_recursive().len()
    }

    /// Whether the owner holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one element, relocating if capacity is exhausted.
    pub fn push(&self, value: T) {
        self.grow(|v| v.push(value));
    }

    /// Append every element of `iter`, relocating as needed.
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) {
        self.grow(|v| v.extend(iter));
    }

    /// Reserve capacity for at least `additional` more elements.
    pub fn reserve(&self, additional: usize) {
        self.grow(|v| v.reserve(additional));
    }

    fn grow(&self, op: impl FnOnce(&mut Vec<T>)) {
        let mut storage = self.storage.write();
        let before = storage.as_ptr().addr();
        op(&mut *storage);
        let after = storage.as_ptr().addr();
        self.note_move(before, after);
    }
}

impl<S: Storage + Default> Default for Owner<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> std::fmt::Debug for Owner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owner")
            .field("relocations", &self.relocations.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
