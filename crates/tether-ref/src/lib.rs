//! Relocation-safe references into owned, movable storage.
//!
//! A [`Ref`] or [`ReadOnlyRef`] designates a single value that lives
//! inside another object or buffer. The storage may move between the time
//! a reference is created and the time it is dereferenced; the reference
//! keeps working because it stores *where* the value sits relative to its
//! owner, not the absolute address.
//!
//! # Architecture
//!
//! ```text
//! Ref / ReadOnlyRef
//! └── Anchor
//!     ├── Direct(NonNull<T>)            fixed address, lifetime-bound
//!     └── Anchored { owner, offset }    owner handle + byte offset
//!         └── Arc<Owner<S>>
//!             └── RwLock<S: Storage>    Vec<T> or Box<T>, may relocate
//! ```
//!
//! # Addressing modes
//!
//! - **Direct:** built from a borrow (`&mut T` / `&T`) or a raw pointer.
//!   Dereferencing returns the fixed address.
//! - **Anchored:** built against an [`Owner`]. The byte offset is computed
//!   once; every dereference recomputes `origin + offset` under the owner's
//!   read lock, so relocation (explicit, or a `Vec` outgrowing its
//!   capacity) never invalidates the reference.
//!
//! # Safety
//!
//! Pointer arithmetic is confined to `raw.rs` and the address resolution
//! in `anchor.rs`. The checked constructors ([`Ref::element`],
//! [`Ref::root`], [`Ref::new`]) verify bounds once, at construction; the
//! dereference path never does.
//!
//! ```rust
//! use tether_ref::{Owner, Ref};
//!
//! let owner = Owner::new(vec![1u32, 2, 3]).into_shared();
//! let mut second = Ref::element(&owner, 1).unwrap();
//! second.set(20);
//!
//! owner.relocate();
//! owner.extend(4..100);
//!
//! assert_eq!(second.get(), 20);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod anchor;
pub mod error;
pub mod guard;
pub mod owner;
mod raw;
pub mod read_only;
pub mod stable_ref;
pub mod storage;

// Public re-exports for the primary API surface.
pub use error::RefError;
pub use guard::{RefGuard, RefGuardMut};
pub use owner::{Owner, SharedOwner};
pub use read_only::ReadOnlyRef;
pub use stable_ref::Ref;
pub use storage::Storage;
