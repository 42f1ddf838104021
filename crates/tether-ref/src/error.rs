//! Reference construction errors.

/// Errors returned by the checked reference constructors.
///
/// Dereferencing never fails; every check happens once, when the
/// reference is built. The unchecked constructors skip these checks and
/// return no error at all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RefError {
    /// The projected value does not lie entirely inside the owner's
    /// storage (e.g. it was reached through a pointer held by the owner
    /// rather than stored inline).
    #[error("value at byte offset {offset} (size {size}) is outside the owner's {extent}-byte storage")]
    OutsideOwner {
        /// Signed distance from the owner's origin to the value.
        offset: isize,
        /// Size of the referenced value in bytes.
        size: usize,
        /// Size of the owner's storage in bytes.
        extent: usize,
    },
    /// Element index past the end of slice-backed storage.
    #[error("element index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of elements in the owner.
        len: usize,
    },
}
