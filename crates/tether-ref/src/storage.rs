//! Backing storage that an [`Owner`](crate::Owner) may relocate.
//!
//! A [`Storage`] value is the handle that owns the allocation (a `Vec`,
//! a `Box`); its [`Target`](Storage::Target) is the region anchored
//! references point into. Relocation moves the target to a new address
//! without changing its contents or layout.

use crate::raw;

/// Owned storage whose target region can move in memory.
///
/// # Safety
///
/// Anchored references store a byte offset into [`target`](Self::target)
/// and resolve it after arbitrary relocations. Implementations must
/// guarantee that:
///
/// - `target()` and `target_mut()` return the same region;
/// - the region never shrinks (mutation through `target_mut()` or
///   `relocate()` cannot reduce `size_of_val(target())`);
/// - `relocate()` preserves every byte of the region, only its address
///   may change.
#[allow(unsafe_code)]
pub unsafe trait Storage {
    /// The region references point into.
    type Target: ?Sized;

    /// Shared view of the target region.
    fn target(&self) -> &Self::Target;

    /// Exclusive view of the target region.
    fn target_mut(&mut self) -> &mut Self::Target;

    /// Move the target region to a fresh allocation.
    fn relocate(&mut self);
}

// SAFETY: the target is the initialised prefix of the buffer. Owners only
// expose `&mut [T]` and grow-only operations, so the length never drops.
// `append` moves every element into the new buffer unchanged.
#[allow(unsafe_code)]
unsafe impl<T> Storage for Vec<T> {
    type Target = [T];

    fn target(&self) -> &[T] {
        self.as_slice()
    }

    fn target_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }

    fn relocate(&mut self) {
        let mut fresh = Vec::with_capacity(self.capacity());
        fresh.append(self);
        *self = fresh;
    }
}

// SAFETY: the target is the whole boxed value, whose size is fixed by `T`.
// `relocate_box` copies the value bit-for-bit into a new allocation.
#[allow(unsafe_code)]
unsafe impl<T> Storage for Box<T> {
    type Target = T;

    fn target(&self) -> &T {
        self
    }

    fn target_mut(&mut self) -> &mut T {
        self
    }

    fn relocate(&mut self) {
        raw::relocate_box(self);
    }
}
