//! The fragment heap: a LIFO free-list allocator over a caller-supplied,
//! pre-mapped byte region, quantizing every allocation to a multiple of a
//! fixed fragment size.
//!
//! Unlike a general-purpose allocator this never coalesces adjacent free
//! blocks and never searches past the top of the free list for a best fit —
//! see the crate-level design notes for why that tradeoff is acceptable for
//! its intended caller.

use std::{
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use crossbeam_utils::CachePadded;
use log::{debug, trace};
use parking_lot::Mutex;
use tinyvec::TinyVec;

/// A single allocated or free block: a raw pointer into the heap's backing
/// region plus its size in bytes.
///
/// [`HeapEntry::empty`] is the sentinel returned by [`FragmentHeap::alloc`]
/// on exhaustion: a null pointer and zero size, never a dangling non-null
/// pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapEntry {
    /// Start of the block, or null for [`HeapEntry::empty`].
    pub pointer: *mut u8,
    /// Size of the block in bytes, always a multiple of the owning heap's
    /// fragment size (or zero for [`HeapEntry::empty`]).
    pub size: usize,
}

impl HeapEntry {
    /// The exhaustion sentinel: a null pointer and zero size.
    pub const fn empty() -> Self {
        HeapEntry { pointer: std::ptr::null_mut(), size: 0 }
    }

    /// Whether this is the exhaustion sentinel.
    pub fn is_empty(&self) -> bool {
        self.pointer.is_null()
    }
}

impl Default for HeapEntry {
    fn default() -> Self {
        HeapEntry::empty()
    }
}

fn round_up_to_fragment(requested: usize, fragment_size: usize) -> usize {
    requested.div_ceil(fragment_size) * fragment_size
}

/// A LIFO free-list allocator over a single caller-owned region.
///
/// The heap does not map, unmap, or own the backing region; the caller must
/// keep `base..base + size` valid for the heap's entire lifetime.
///
/// # Concurrency
///
/// Structural mutation of the free list is serialized by an internal mutex.
/// [`FragmentHeap::used_bytes`] reads a cache-line-padded atomic counter that
/// is updated outside that lock, so it never blocks on an in-flight
/// `alloc`/`free` and may be briefly stale under concurrent access.
pub struct FragmentHeap {
    base: NonNull<u8>,
    size: usize,
    fragment_size: usize,
    free_list: Mutex<TinyVec<[HeapEntry; 8]>>,
    used_bytes: CachePadded<AtomicUsize>,
}

// SAFETY: all access to `base`'s region goes through `alloc`/`free`, which
// serialize free-list mutation behind `free_list`'s mutex; `used_bytes` is
// only ever touched through atomic operations.
unsafe impl Send for FragmentHeap {}
// SAFETY: see the `Send` impl above; no method hands out unsynchronized
// access to the raw region.
unsafe impl Sync for FragmentHeap {}

impl FragmentHeap {
    /// Create a heap over `base..base + size`, handing out fragments rounded
    /// up to a multiple of `fragment_size`.
    ///
    /// `size` need not be a multiple of `fragment_size`: the seeded
    /// whole-heap entry may have a tail shorter than one fragment, which
    /// simply never satisfies an `alloc` once every earlier fragment's worth
    /// has been split off (see invariant 4).
    ///
    /// # Panics
    ///
    /// Panics if `fragment_size` is zero.
    ///
    /// # Safety
    ///
    ///  - `base` must be valid for reads and writes for `size` bytes for the
    ///    entire lifetime of the returned heap.
    ///  - No other code may access `base..base + size` except through the
    ///    entries this heap hands out.
    pub unsafe fn create(base: NonNull<u8>, size: usize, fragment_size: usize) -> Self {
        assert_ne!(fragment_size, 0, "fragment size must be non-zero");

        let mut free_list = TinyVec::new();
        if size > 0 {
            free_list.push(HeapEntry { pointer: base.as_ptr(), size });
        }

        debug!("heap created: size={size} fragment_size={fragment_size}");
        FragmentHeap {
            base,
            size,
            fragment_size,
            free_list: Mutex::new(free_list),
            used_bytes: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Allocate at least `requested_size` bytes, rounded up to a multiple of
    /// the heap's fragment size.
    ///
    /// Returns [`HeapEntry::empty`] if the block at the top of the free list
    /// is smaller than the rounded request — this allocator never searches
    /// past the top of the free list for a better fit.
    pub fn alloc(&self, requested_size: usize) -> HeapEntry {
        if requested_size == 0 {
            return HeapEntry::empty();
        }

        let rounded = round_up_to_fragment(requested_size, self.fragment_size);
        trace!("alloc: requested={requested_size} rounded={rounded}");

        let mut free_list = self.free_list.lock();
        let Some(&top) = free_list.last() else {
            debug!("alloc: free list empty, {rounded} bytes unavailable");
            return HeapEntry::empty();
        };
        if top.size < rounded {
            debug!("alloc: top free block ({} bytes) smaller than request ({rounded})", top.size);
            return HeapEntry::empty();
        }

        free_list.pop();
        let remainder_size = top.size - rounded;
        if remainder_size > 0 {
            // SAFETY: `top.pointer` is valid for `top.size` bytes (either the
            // original region or a block previously split from it); `rounded
            // <= top.size` keeps the offset in bounds.
            let remainder_pointer = unsafe { top.pointer.add(rounded) };
            free_list.push(HeapEntry { pointer: remainder_pointer, size: remainder_size });
        }
        drop(free_list);

        // Updated outside the free-list lock: readers of `used_bytes` never
        // block on an in-flight structural mutation.
        self.used_bytes.fetch_add(rounded, Ordering::SeqCst);
        HeapEntry { pointer: top.pointer, size: rounded }
    }

    /// Return `entry` to the free list. A no-op for [`HeapEntry::empty`].
    ///
    /// # Safety
    ///
    ///  - `entry` must have been produced by a prior [`FragmentHeap::alloc`]
    ///    on this heap and not already freed.
    pub unsafe fn free(&self, entry: HeapEntry) {
        if entry.is_empty() {
            return;
        }
        trace!("free: size={}", entry.size);

        debug_assert!(
            (entry.pointer as usize) >= (self.base.as_ptr() as usize)
                && (entry.pointer as usize) + entry.size <= (self.base.as_ptr() as usize) + self.size,
            "freed entry does not fall within this heap's region"
        );

        self.free_list.lock().push(entry);
        self.used_bytes.fetch_sub(entry.size, Ordering::SeqCst);
    }

    /// Bytes currently handed out via `alloc` and not yet returned via `free`.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::SeqCst)
    }

    /// The heap's full backing region size, in bytes.
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// The fragment size every allocation is rounded up to.
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Consume the heap. The backing region is caller-owned and is never
    /// unmapped here; provided for symmetry with the C lifecycle API this
    /// crate replaces.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for FragmentHeap {
    fn drop(&mut self) {
        let in_use = self.used_bytes();
        if in_use > 0 {
            debug!("heap dropped with {in_use} bytes still outstanding");
        }
    }
}
