//! Mutable relocation-safe reference.
//!
//! A [`Ref`] designates exactly one `T`. In direct mode it wraps an
//! exclusive borrow; in anchored mode it stores an owner handle and a byte
//! offset, and resolves `origin + offset` on every access. The offset is
//! fixed at construction and survives any number of relocations.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::anchor::Anchor;
use crate::error::RefError;
use crate::guard::{RefGuard, RefGuardMut};
use crate::owner::SharedOwner;
use crate::read_only::ReadOnlyRef;
use crate::storage::Storage;

/// Mutable handle to one value inside an owner or at a fixed address.
///
/// `'a` bounds direct-mode references to the borrow they were built
/// from; anchored references can use any lifetime (typically `'static`),
/// since they keep their owner alive.
///
/// `Ref` deliberately has no equality, hashing, or ordering.
pub struct Ref<'a, T, S = Vec<T>> {
    anchor: Anchor<T, S>,
    _borrow: PhantomData<&'a mut T>,
}

impl<'a, T> Ref<'a, T> {
    /// Direct-mode reference to a borrowed value.
    pub fn direct(value: &'a mut T) -> Self {
        Self::from_anchor(Anchor::Direct(NonNull::from(value)))
    }

    /// Direct-mode reference to a raw address.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `T`, must not move,
    /// and must not be accessed through any other path for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self::from_anchor(Anchor::Direct(ptr))
    }
}

impl<'a, T, S: Storage> Ref<'a, T, S> {
    /// Anchored reference to a value projected out of `owner`'s target.
    ///
    /// Returns [`RefError::OutsideOwner`] when the projection does not land
    /// inside the target region (for example, a value reached through a
    /// `Box` or `Vec` held by the owner).
    ///
    /// # Safety
    ///
    /// The projected location must hold a `T` for the owner's whole
    /// lifetime. Projecting into an enum payload is unsound if the variant
    /// can change through [`Owner::write`](crate::Owner::write).
    #[allow(unsafe_code)]
    pub unsafe fn new<F>(owner: &SharedOwner<S>, project: F) -> Result<Self, RefError>
    where
        F: FnOnce(&S::Target) -> &T,
    {
        Anchor::project(owner, project).map(Self::from_anchor)
    }

    /// Anchored reference to a raw address inside `owner`'s target, with no
    /// bounds check.
    ///
    /// # Safety
    ///
    /// `value` must point at a properly aligned `T` lying entirely inside
    /// the owner's current target, and that location must hold a `T` for
    /// the owner's whole lifetime. Violations are undefined behaviour on
    /// the next dereference.
    #[allow(unsafe_code)]
    pub unsafe fn new_unchecked(owner: &SharedOwner<S>, value: *const T) -> Self {
        // SAFETY: forwarded caller obligation.
        Self::from_anchor(unsafe { Anchor::from_ptr(owner, value) })
    }

    /// Anchored reference to the whole target of `owner`.
    pub fn root(owner: &SharedOwner<S>) -> Self
    where
        S: Storage<Target = T>,
    {
        Self::from_anchor(Anchor::root(owner))
    }

    /// Anchored reference to element `index` of slice-shaped storage.
    pub fn element(owner: &SharedOwner<S>, index: usize) -> Result<Self, RefError>
    where
        S: Storage<Target = [T]>,
    {
        Anchor::element(owner, index).map(Self::from_anchor)
    }

    /// Shared access to the current value.
    ///
    /// Anchored references take the owner's read lock and recompute the
    /// address; relocation waits until the guard is dropped.
    #[inline]
    pub fn read(&self) -> RefGuard<'_, T> {
        self.anchor.read()
    }

    /// Exclusive access to the current value.
    ///
    /// Anchored references take the owner's write lock, so anchored writes
    /// are serialized across the whole owner: parallel actions writing
    /// through refs into one owner run one at a time. For parallel writes,
    /// split the target with [`Owner::write`](crate::Owner::write) into
    /// disjoint chunks, or use direct refs into those chunks.
    #[inline]
    pub fn write(&mut self) -> RefGuardMut<'_, T> {
        self.anchor.write()
    }

    /// Clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.read().clone()
    }

    /// Overwrite the current value.
    pub fn set(&mut self, value: T) {
        *self.write() = value;
    }

    /// Overwrite the current value, returning the previous one.
    pub fn replace(&mut self, value: T) -> T {
        std::mem::replace(&mut *self.write(), value)
    }

    /// Read-only view sharing this reference's target.
    pub fn to_read_only(&self) -> ReadOnlyRef<'_, T, S> {
        ReadOnlyRef::from_anchor(self.anchor.clone())
    }
}

impl<'a, T, S> Ref<'a, T, S> {
    pub(crate) fn from_anchor(anchor: Anchor<T, S>) -> Self {
        Self {
            anchor,
            _borrow: PhantomData,
        }
    }

    pub(crate) fn into_anchor(self) -> Anchor<T, S> {
        self.anchor
    }

    /// Whether this reference resolves through an owner.
    pub fn is_anchored(&self) -> bool {
        self.anchor.offset().is_some()
    }

    /// Byte offset from the owner's origin; `None` in direct mode.
    pub fn offset(&self) -> Option<usize> {
        self.anchor.offset()
    }

    /// The owner this reference keeps alive; `None` in direct mode.
    pub fn owner(&self) -> Option<&SharedOwner<S>> {
        self.anchor.owner()
    }
}

impl<T, S> fmt::Debug for Ref<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.anchor).finish()
    }
}

// SAFETY: a direct `Ref` behaves like `&mut T`; an anchored one like an
// `Arc<Owner<S>>` whose lock serializes access to the `T` inside.
#[allow(unsafe_code)]
unsafe impl<T: Send + Sync, S: Send + Sync> Send for Ref<'_, T, S> {}

// SAFETY: shared access only reads through `read()`, which hands out `&T`
// under the owner's read lock (or a plain borrow in direct mode).
#[allow(unsafe_code)]
unsafe impl<T: Send + Sync, S: Send + Sync> Sync for Ref<'_, T, S> {}
