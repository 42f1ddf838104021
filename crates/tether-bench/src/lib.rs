//! Benchmark profiles and utilities for tether.
//!
//! Provides pre-built owners and loop bodies shared by the benchmarks:
//!
//! - [`reference_owner`]: shared `Vec<u64>` owner with anchored refs into it
//! - [`busy_work`]: a small deterministic per-index workload
//! - [`LOOP_SIZES`]: index counts swept by the scheduling benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tether_ref::{Owner, Ref, SharedOwner};

/// Index counts swept by the scheduling benchmarks.
pub const LOOP_SIZES: [usize; 4] = [64, 1_024, 16_384, 262_144];

/// Build a shared `Vec<u64>` owner of `len` elements holding `0..len`, and
/// one anchored reference per `stride`-th element.
pub fn reference_owner(
    len: usize,
    stride: usize,
) -> (SharedOwner<Vec<u64>>, Vec<Ref<'static, u64>>) {
    let owner = Owner::new((0..len as u64).collect::<Vec<_>>()).into_shared();
    let refs = (0..len)
        .step_by(stride.max(1))
        .filter_map(|i| Ref::element(&owner, i).ok())
        .collect();
    (owner, refs)
}

/// A few rounds of xorshift on `index`; cheap, but not free to optimise out.
pub fn busy_work(index: usize) -> u64 {
    let mut x = index as u64 ^ 0x9E37_79B9_7F4A_7C15;
    for _ in 0..16 {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
    }
    x
}
