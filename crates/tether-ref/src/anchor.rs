//! Addressing shared by [`Ref`](crate::Ref) and [`ReadOnlyRef`](crate::ReadOnlyRef).
//!
//! An [`Anchor`] is either a fixed address (direct mode) or an owner handle
//! plus a byte offset (anchored mode). Anchored resolution recomputes
//! `origin + offset` under the owner's lock on every access.

#![allow(unsafe_code)]

use std::fmt;
use std::mem::size_of;
use std::ptr::NonNull;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};

use crate::error::RefError;
use crate::guard::{RefGuard, RefGuardMut};
use crate::owner::SharedOwner;
use crate::raw;
use crate::storage::Storage;

pub(crate) enum Anchor<T, S> {
    /// Fixed address; the wrapping reference's lifetime proves it stays put.
    Direct(NonNull<T>),
    /// Owner handle plus byte offset from the owner's origin.
    Anchored { owner: SharedOwner<S>, offset: usize },
}

impl<T, S: Storage> Anchor<T, S> {
    /// Anchor to a value projected out of the owner's target.
    ///
    /// Fails if the projected value is not entirely inside the target.
    pub(crate) fn project<F>(owner: &SharedOwner<S>, project: F) -> Result<Self, RefError>
    where
        F: FnOnce(&S::Target) -> &T,
    {
        let storage = owner.storage().read_recursive();
        let target = storage.target();
        let value = project(target);
        let offset = raw::byte_distance(target, value);
        let extent = std::mem::size_of_val(target);
        let size = size_of::<T>();
        let inside = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(size))
            .is_some_and(|end| end <= extent);
        if !inside {
            return Err(RefError::OutsideOwner {
                offset,
                size,
                extent,
            });
        }
        drop(storage);
        Ok(Self::Anchored {
            owner: SharedOwner::clone(owner),
            offset: offset as usize,
        })
    }

    /// Anchor to a raw address inside the owner's target, unchecked.
    ///
    /// # Safety
    ///
    /// `value` must point into the owner's current target region at a
    /// position that holds a `T` for the owner's whole lifetime.
    pub(crate) unsafe fn from_ptr(owner: &SharedOwner<S>, value: *const T) -> Self {
        let offset = raw::byte_distance(owner.storage().read_recursive().target(), value);
        debug_assert!(offset >= 0, "value precedes the owner's origin");
        Self::Anchored {
            owner: SharedOwner::clone(owner),
            offset: offset as usize,
        }
    }

    /// Anchor to the whole target.
    pub(crate) fn root(owner: &SharedOwner<S>) -> Self
    where
        S: Storage<Target = T>,
    {
        Self::Anchored {
            owner: SharedOwner::clone(owner),
            offset: 0,
        }
    }

    /// Anchor to element `index` of slice-shaped storage.
    pub(crate) fn element(owner: &SharedOwner<S>, index: usize) -> Result<Self, RefError>
    where
        S: Storage<Target = [T]>,
    {
        let len = owner.storage().read_recursive().target().len();
        if index >= len {
            return Err(RefError::IndexOutOfBounds { index, len });
        }
        Ok(Self::Anchored {
            owner: SharedOwner::clone(owner),
            offset: index * size_of::<T>(),
        })
    }

    pub(crate) fn read(&self) -> RefGuard<'_, T> {
        match self {
            // SAFETY: direct anchors are only built from a live borrow (or a
            // raw pointer the caller vouched for) that outlives `self`.
            Self::Direct(ptr) => RefGuard::direct(unsafe { ptr.as_ref() }),
            Self::Anchored { owner, offset } => {
                let offset = *offset;
                // Recursive read: nested dereferences against one owner are
                // common inside parallel actions.
                let storage = owner.storage().read_recursive();
                let mapped: MappedRwLockReadGuard<'_, T> = RwLockReadGuard::map(storage, |s| {
                    // SAFETY: `offset` was validated (or vouched for) against
                    // this owner at construction. `Storage` targets never
                    // shrink and relocation preserves layout, so the offset
                    // still names the same `T`. The read lock excludes
                    // relocation until the guard drops.
                    unsafe { raw::resolve::<S::Target, T>(s.target(), offset) }
                });
                RefGuard::anchored(mapped)
            }
        }
    }

    /// Exclusive access; `&mut self` keeps direct anchors unaliased.
    pub(crate) fn write(&mut self) -> RefGuardMut<'_, T> {
        match self {
            // SAFETY: direct anchors for mutable references are built from
            // an exclusive borrow, and `&mut self` forbids a second guard.
            Self::Direct(ptr) => RefGuardMut::direct(unsafe { ptr.as_mut() }),
            Self::Anchored { owner, offset } => {
                let offset = *offset;
                let storage = owner.storage().write();
                let mapped: MappedRwLockWriteGuard<'_, T> = RwLockWriteGuard::map(storage, |s| {
                    // SAFETY: as in `read`; the write lock also excludes
                    // every other reader of the owner.
                    unsafe { raw::resolve_mut::<S::Target, T>(s.target_mut(), offset) }
                });
                RefGuardMut::anchored(mapped)
            }
        }
    }
}

impl<T, S> Anchor<T, S> {
    pub(crate) fn offset(&self) -> Option<usize> {
        match self {
            Self::Direct(_) => None,
            Self::Anchored { offset, .. } => Some(*offset),
        }
    }

    pub(crate) fn owner(&self) -> Option<&SharedOwner<S>> {
        match self {
            Self::Direct(_) => None,
            Self::Anchored { owner, .. } => Some(owner),
        }
    }
}

impl<T, S> Clone for Anchor<T, S> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct(ptr) => Self::Direct(*ptr),
            Self::Anchored { owner, offset } => Self::Anchored {
                owner: SharedOwner::clone(owner),
                offset: *offset,
            },
        }
    }
}

impl<T, S> fmt::Debug for Anchor<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(ptr) => f.debug_tuple("Direct").field(ptr).finish(),
            Self::Anchored { offset, .. } => {
                f.debug_struct("Anchored").field("offset", offset).finish()
            }
        }
    }
}
