//! Crate-wide error types.
//!
//! Miss and empty-allocation results are never errors (see [`crate::index::Index::get`]
//! and [`crate::heap::FragmentHeap::alloc`]); this type only covers the failure modes
//! documented for [`crate::index::Index::set`].

use thiserror::Error;

/// Failure modes of [`Index::set`][crate::index::Index::set].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// The key is equal to, a prefix of, or an extension of an already-stored key.
    #[error("key is already present, or is a prefix/extension of a stored key")]
    AlreadyPresent,

    /// A node or leaf allocation failed; the tree is left unchanged.
    #[error("out of memory while inserting")]
    OutOfMemory,

    /// The key is longer than this index can address.
    #[error("key length {0} exceeds the maximum representable key length")]
    KeyTooLong(usize),
}
