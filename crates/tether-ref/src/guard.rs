//! Dereference guards returned by [`Ref`](crate::Ref) and
//! [`ReadOnlyRef`](crate::ReadOnlyRef).
//!
//! An anchored guard holds the owner's lock, so the owner cannot relocate
//! while the guard is alive. A direct guard is a plain borrow.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

/// Shared access to a referenced value.
#[must_use = "the guard releases the owner's lock when dropped"]
pub struct RefGuard<'g, T> {
    inner: ReadInner<'g, T>,
}

enum ReadInner<'g, T> {
    Direct(&'g T),
    Anchored(MappedRwLockReadGuard<'g, T>),
}

impl<'g, T> RefGuard<'g, T> {
    pub(crate) fn direct(value: &'g T) -> Self {
        Self {
            inner: ReadInner::Direct(value),
        }
    }

    pub(crate) fn anchored(guard: MappedRwLockReadGuard<'g, T>) -> Self {
        Self {
            inner: ReadInner::Anchored(guard),
        }
    }
}

impl<T> Deref for RefGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match &self.inner {
            ReadInner::Direct(value) => *value,
            ReadInner::Anchored(guard) => &**guard,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RefGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Exclusive access to a referenced value.
#[must_use = "the guard releases the owner's lock when dropped"]
pub struct RefGuardMut<'g, T> {
    inner: WriteInner<'g, T>,
}

enum WriteInner<'g, T> {
    Direct(&'g mut T),
    Anchored(MappedRwLockWriteGuard<'g, T>),
}

impl<'g, T> RefGuardMut<'g, T> {
    pub(crate) fn direct(value: &'g mut T) -> Self {
        Self {
            inner: WriteInner::Direct(value),
        }
    }

    pub(crate) fn anchored(guard: MappedRwLockWriteGuard<'g, T>) -> Self {
        Self {
            inner: WriteInner::Anchored(guard),
        }
    }
}

impl<T> Deref for RefGuardMut<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match &self.inner {
            WriteInner::Direct(value) => &**value,
            WriteInner::Anchored(guard) => &**guard,
        }
    }
}

impl<T> DerefMut for RefGuardMut<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.inner {
            WriteInner::Direct(value) => &mut **value,
            WriteInner::Anchored(guard) => &mut **guard,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RefGuardMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
