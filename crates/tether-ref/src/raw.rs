//! Low-level primitives for byte-offset addressing.
//!
//! All pointer arithmetic in this crate lives here, each `unsafe` block
//! with a mandatory `// SAFETY:` comment. Callers outside this module work
//! with plain `usize` offsets and never hold an absolute address across a
//! lock release.

#![allow(unsafe_code)]

use std::mem::{ManuallyDrop, MaybeUninit};

/// Address of the first byte of `target`.
#[inline]
pub(crate) fn origin<U: ?Sized>(target: &U) -> *const u8 {
    (target as *const U).cast::<u8>()
}

/// Signed byte distance from the origin of `target` to `value`.
///
/// Pure address arithmetic; neither pointer is dereferenced.
#[inline]
pub(crate) fn byte_distance<U: ?Sized, T>(target: &U, value: *const T) -> isize {
    (value.cast::<u8>().addr() as isize).wrapping_sub(origin(target).addr() as isize)
}

/// Resolve a `T` stored `offset` bytes past the origin of `target`.
///
/// # Safety
///
/// `origin(target) + offset` must be a properly aligned, initialised `T`
/// lying entirely inside `target`.
#[inline]
pub(crate) unsafe fn resolve<U: ?Sized, T>(target: &U, offset: usize) -> &T {
    // SAFETY: the caller guarantees the region is an in-bounds, aligned
    // `T`; the returned borrow is tied to `target`'s borrow.
    unsafe { &*origin(target).add(offset).cast::<T>() }
}

/// Mutable counterpart of [`resolve`].
///
/// # Safety
///
/// Same contract as [`resolve`].
#[inline]
pub(crate) unsafe fn resolve_mut<U: ?Sized, T>(target: &mut U, offset: usize) -> &mut T {
    // SAFETY: as in `resolve`; exclusivity follows from `&mut U`.
    unsafe { &mut *(target as *mut U).cast::<u8>().add(offset).cast::<T>() }
}

/// Move a boxed value into a fresh heap allocation.
///
/// The new allocation is made while the old one is still live, so the
/// two never share an address. Zero-sized values are left in place.
pub(crate) fn relocate_box<T>(slot: &mut Box<T>) {
    if std::mem::size_of::<T>() == 0 {
        return;
    }
    let mut fresh: Box<MaybeUninit<T>> = Box::new_uninit();
    // SAFETY: `fresh` is a separate live allocation sized and aligned for
    // `T`, so source and destination cannot overlap.
    unsafe { std::ptr::copy_nonoverlapping(&**slot as *const T, fresh.as_mut_ptr(), 1) };
    // SAFETY: fully initialised by the copy above.
    let fresh = unsafe { fresh.assume_init() };
    let stale = std::mem::replace(slot, fresh);
    let stale = Box::into_raw(stale).cast::<ManuallyDrop<T>>();
    // SAFETY: `stale` came from `Box::into_raw` and `ManuallyDrop<T>` has
    // the layout of `T`. The value itself now lives in `slot`, so only the
    // allocation is released here.
    drop(unsafe { Box::from_raw(stale) });
}
