//! Tether: relocation-safe references and batched parallel loops.
//!
//! This is the top-level facade crate that re-exports the public API from
//! both tether sub-crates. For most users, adding `tether` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tether::prelude::*;
//!
//! // A growable buffer whose storage may move at any time.
//! let owner = Owner::new(vec![0u64; 64]).into_shared();
//!
//! parallel_for(0, 64, 8, |i| {
//!     let mut slot: Ref<'_, u64> = Ref::element(&owner, i)?;
//!     slot.set(i as u64 * 2);
//!     Ok::<(), RefError>(())
//! })
//! .unwrap();
//!
//! // Growth relocates the buffer; a reference taken earlier still resolves.
//! let last: ReadOnlyRef<'_, u64> = ReadOnlyRef::element(&owner, 63).unwrap();
//! owner.extend(0..1024);
//! assert_eq!(last.get(), 126);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`refs`] | `tether-ref` | `Owner`, `Ref`, `ReadOnlyRef`, access guards, `Storage` |
//! | [`par`] | `tether-par` | `parallel_for`, `Scheduler`, `BatchPlan`, error types |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Relocation-safe references (`tether-ref`).
///
/// [`refs::Owner`] holds relocatable storage; [`refs::Ref`] and
/// [`refs::ReadOnlyRef`] address one value inside it by offset.
pub use tether_ref as refs;

/// Batched parallel loops (`tether-par`).
///
/// [`par::parallel_for`] for one-off loops, [`par::Scheduler`] for a
/// reusable configuration with an optional dedicated worker pool.
pub use tether_par as par;

/// Common imports for typical tether usage.
///
/// ```rust
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // References
    pub use tether_ref::{Owner, ReadOnlyRef, Ref, RefError, SharedOwner, Storage};

    // Scheduling
    pub use tether_par::{
        parallel_for, parallel_for_each, BatchPlan, ParallelError, Scheduler, SchedulerConfig,
    };
}
