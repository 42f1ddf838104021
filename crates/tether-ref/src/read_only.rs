//! Read-only relocation-safe reference.
//!
//! [`ReadOnlyRef`] shares [`Ref`]'s addressing and only exposes reads. A
//! `Ref` narrows into a `ReadOnlyRef` for free; there is no conversion
//! back.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::anchor::Anchor;
use crate::error::RefError;
use crate::guard::RefGuard;
use crate::owner::SharedOwner;
use crate::stable_ref::Ref;
use crate::storage::Storage;

/// Read-only handle to one value inside an owner or at a fixed address.
pub struct ReadOnlyRef<'a, T, S = Vec<T>> {
    anchor: Anchor<T, S>,
    _borrow: PhantomData<&'a T>,
}

impl<'a, T> ReadOnlyRef<'a, T> {
    /// Direct-mode reference to a borrowed value.
    pub fn direct(value: &'a T) -> Self {
        Self::from_anchor(Anchor::Direct(NonNull::from(value)))
    }

    /// Direct-mode reference to a raw address.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `T`, must not move, and must not
    /// be written through any other path for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self::from_anchor(Anchor::Direct(ptr))
    }
}

impl<'a, T, S: Storage> ReadOnlyRef<'a, T, S> {
    /// Anchored reference to a value projected out of `owner`'s target.
    ///
    /// # Safety
    ///
    /// Same contract as [`Ref::new`].
    #[allow(unsafe_code)]
    pub unsafe fn new<F>(owner: &SharedOwner<S>, project: F) -> Result<Self, RefError>
    where
        F: FnOnce(&S::Target) -> &T,
    {
        Anchor::project(owner, project).map(Self::from_anchor)
    }

    /// Anchored reference to a raw address, with no bounds check.
    ///
    /// # Safety
    ///
    /// Same contract as [`Ref::new_unchecked`].
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
    #[inline]
    pub fn read(&self) -> RefGuard<'_, T> {
        self.anchor.read()
    }

    /// Clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.read().clone()
    }
}

impl<'a, T, S> ReadOnlyRef<'a, T, S> {
    pub(crate) fn from_anchor(anchor: Anchor<T, S>) -> Self {
        Self {
            anchor,
            _borrow: PhantomData,
        }
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

impl<'a, T, S> From<Ref<'a, T, S>> for ReadOnlyRef<'a, T, S> {
    fn from(r: Ref<'a, T, S>) -> Self {
        Self::from_anchor(r.into_anchor())
    }
}

impl<T, S> Clone for ReadOnlyRef<'_, T, S> {
    fn clone(&self) -> Self {
        Self::from_anchor(self.anchor.clone())
    }
}

impl<T, S> fmt::Debug for ReadOnlyRef<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyRef").field(&self.anchor).finish()
    }
}

// SAFETY: a direct `ReadOnlyRef` behaves like `&T`; an anchored one like
// an `Arc<Owner<S>>` that is only ever read-locked.
#[allow(unsafe_code)]
unsafe impl<T: Send + Sync, S: Send + Sync> Send for ReadOnlyRef<'_, T, S> {}

// SAFETY: see `Send`; every access goes through `read()`.
#[allow(unsafe_code)]
unsafe impl<T: Send + Sync, S: Send + Sync> Sync for ReadOnlyRef<'_, T, S> {}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::owner::Owner;

    #[test]
    fn direct_read_only() {
        let value = [1u8, 2, 3];
        let r = ReadOnlyRef::direct(&value);
        let copy = r.clone();
        assert_eq!(*r.read(), [1, 2, 3]);
        assert_eq!(copy.get(), value);
        assert!(!r.is_anchored());
    }

    #[test]
    fn from_raw_reads_fixed_slot() {
        let value = 0x5au8;
        // SAFETY: `value` is live and unmodified for the whole test.
        let r = unsafe { ReadOnlyRef::from_raw(std::ptr::NonNull::from(&value)) };
        assert_eq!(r.get(), 0x5a);
    }

    #[test]
    fn narrowing_preserves_value() {
        let owner = Owner::new(vec![10i64, 20, 30]).into_shared();
        let r = Ref::element(&owner, 2).unwrap();
        let before = r.get();
        let view: ReadOnlyRef<'_, i64> = r.into();
        assert_eq!(view.get(), before);
        assert_eq!(view.offset(), Some(16));
    }

    #[test]
    fn narrowed_direct_ref_keeps_borrow() {
        let mut value = String::from("direct");
        let view = ReadOnlyRef::from(Ref::direct(&mut value));
        assert_eq!(*view.read(), "direct");
    }

    #[test]
    fn sees_writes_made_through_owner_after_relocation() {
        let owner = Owner::new(vec![0u16; 8]).into_shared();
        let view = ReadOnlyRef::element(&owner, 5).unwrap();
        owner.write()[5] = 42;
        owner.relocate();
        assert_eq!(view.get(), 42);
    }

    #[test]
    fn projected_read_only_field() {
        #[repr(C)]
        struct Header {
            magic: u32,
            version: u16,
        }
        let owner = Owner::boxed(Header {
            magic: 0xfeed,
            version: 3,
        })
        .into_shared();
        let version = unsafe { ReadOnlyRef::new(&owner, |h: &Header| &h.version) }.unwrap();
        assert_eq!(version.offset(), Some(4));
        owner.relocate();
        assert_eq!(version.get(), 3);
        assert_eq!(owner.read().magic, 0xfeed);
    }

    #[test]
    fn clones_share_owner() {
        let owner = Owner::new(vec![1u32]).into_shared();
        let a = ReadOnlyRef::element(&owner, 0).unwrap();
        let b = a.clone();
        assert_eq!(std::sync::Arc::strong_count(&owner), 3);
        assert_eq!(a.get(), b.get());
    }
}
