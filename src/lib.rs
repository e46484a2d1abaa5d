#![allow(clippy::type_complexity)]
#![deny(
    missing_docs,
    clippy::missing_safety_doc,
    unsafe_op_in_unsafe_fn,
    deprecated_in_future,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    rustdoc::invalid_codeblock_attributes
)]
#![doc(html_playground_url = "https://play.rust-lang.org/")]

//! A critbit radix index and a fragment-granularity heap allocator, built
//! for value caches backed by persistent memory.
//!
//! [`Index`] maps opaque byte-string keys to an opaque, `Copy` value handle
//! (typically an offset or pointer into a separately managed region) using a
//! fixed 4-bit-stride, 16-way critbit tree. [`FragmentHeap`] is a coarse LIFO
//! allocator over a single caller-supplied region, meant to back the value
//! storage that an [`Index`]'s handles point into.
//!
//! Both types are single-writer: the caller is responsible for serializing
//! mutation (and for excluding readers from an in-flight `set`/`remove`) by
//! whatever means fits its environment — a lock, a generation counter, or
//! single-threaded ownership. Neither type does any internal locking of its
//! own for that path; see each type's documentation for the concurrency it
//! does provide.
//!
//! # Keys are borrowed, not owned
//!
//! [`Index`] never copies or frees the byte strings passed to
//! [`Index::set`]. The caller must keep every inserted key's backing buffer
//! valid and unchanged for as long as that entry remains in the tree. This
//! mirrors the handle-based, externally-owned value storage the index is
//! designed to sit in front of.

mod error;
mod heap;
mod index;
mod node;
mod tagged_pointer;

pub use error::IndexError;
pub use heap::{FragmentHeap, HeapEntry};
pub use index::Index;
pub use node::{FANOUT, STRIDE};
