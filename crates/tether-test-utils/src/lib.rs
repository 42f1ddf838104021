//! Test fixtures for tether development.
//!
//! Provides a thread-safe [`IndexRecorder`] for observing which indices a
//! parallel loop visited (and in what order), a [`FailAt`] action that
//! fails at chosen indices, and a [`Particle`] record for reference tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{particles, FailAt, FixtureError, IndexRecorder, Particle, Recording, Visit};
