//! The critnib index: a 4-bit-stride critbit radix tree over borrowed byte-string
//! keys, mapping to an opaque, `Copy` value handle.
//!
//! See the [crate-level documentation][crate] for the tree's shape and the
//! invariants it maintains. This module implements the lookup, insert, and
//! remove algorithms; node representation lives in [`crate::node`].

use std::ptr::NonNull;

use log::{debug, trace};

use crate::{
    error::IndexError,
    node::{ChildPtr, ChildRef, InnerNode, LeafNode, NIBBLE_MASK, STRIDE},
};

/// A `(byte_offset, bit_shift)` coordinate, in the lexicographic order used
/// to order the tree: `byte_offset` primary, `bit_shift` descending within a
/// byte (the high nibble is the ancestor of the low nibble).
type Coordinate = (u32, u8);

fn is_earlier(candidate: Coordinate, divergence: Coordinate) -> bool {
    candidate.0 < divergence.0 || (candidate.0 == divergence.0 && candidate.1 > divergence.1)
}

/// Find the `(byte_offset, bit_shift)` at which `a` and `b` first differ,
/// rounded down to a stride boundary. Returns `None` if one is a prefix of
/// the other (including the exact-match case).
fn diverge(a: &[u8], b: &[u8]) -> Option<Coordinate> {
    let min_len = a.len().min(b.len());
    for i in 0..min_len {
        if a[i] != b[i] {
            let x = a[i] ^ b[i];
            let msb = 7 - x.leading_zeros();
            let bit_shift = (msb / STRIDE) * STRIDE;
            return Some((i as u32, bit_shift as u8));
        }
    }
    None
}

/// An ordered-by-key radix index mapping borrowed byte-string keys to an
/// opaque, `Copy` value handle.
///
/// # Safety contract
///
/// Every key passed to [`Index::set`] must remain valid and unchanged for as
/// long as the resulting entry stays in the tree (until a matching
/// [`Index::remove`] or the index is dropped). The index never copies or
/// frees key bytes; see Section 5 of the design notes.
pub struct Index<V> {
    root: Option<ChildPtr<V>>,
}

impl<V> Default for Index<V> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: an `Index<V>` owns its entire tree of heap-allocated inner nodes
// and leaves outright (nothing else holds a pointer into it), so moving one
// to another thread is sound whenever `V` itself is. It is deliberately not
// `Sync`: `get`/`set`/`remove` take `&self`/`&mut self` with no internal
// synchronization, so concurrent access from multiple threads must be
// serialized by the caller.
unsafe impl<V: Send> Send for Index<V> {}

impl<V> Index<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        Index { root: None }
    }

    /// Insert `key` → `value`.
    ///
    /// # Errors
    ///
    ///  - [`IndexError::AlreadyPresent`] if `key` equals, is a prefix of, or
    ///    is an extension of an already-stored key. The tree is left
    ///    unchanged.
    ///  - [`IndexError::KeyTooLong`] if `key.len()` does not fit in a `u32`.
    ///    The tree is left unchanged.
    ///
    /// This never returns [`IndexError::OutOfMemory`] today: node and leaf
    /// storage comes from the global allocator, which aborts the process on
    /// allocation failure rather than reporting it. The variant is kept in
    /// [`IndexError`] to preserve the documented contract for a future
    /// fallible-allocation backend.
    ///
    /// # Safety
    ///
    /// The caller must keep `key` valid and unchanged for as long as this
    /// entry remains in the tree (see the [`Index`] safety contract).
    pub unsafe fn set(&mut self, key: &[u8], value: V) -> Result<(), IndexError> {
        if u32::try_from(key.len()).is_err() {
            return Err(IndexError::KeyTooLong(key.len()));
        }
        trace!("set: key_len={}", key.len());

        let Some(root) = self.root else {
            // SAFETY: caller's safety contract covers key liveness.
            let leaf = unsafe { LeafNode::new(key, value) }.allocate();
            self.root = Some(ChildPtr::from_leaf(leaf));
            debug!("set: empty tree, wrote leaf directly into root");
            return Ok(());
        };

        // Pass 1: find a witness leaf sharing the longest prefix reachable
        // from the root along `key`'s own path.
        // SAFETY: the tree is well-formed by construction; `root` is non-empty.
        let witness_ptr = unsafe { find_witness_leaf(root, key) };
        // SAFETY: the witness leaf's key buffer is kept alive by its own
        // insertion safety contract, and we do not mutate the tree until
        // after we are done reading it here.
        let witness_key = unsafe { witness_ptr.as_ref().key() };

        // Pass 2: locate the divergence point, or detect a duplicate/prefix key.
        let Some(divergence) = diverge(witness_key, key) else {
            debug!("set: key already present or in a prefix relationship");
            return Err(IndexError::AlreadyPresent);
        };

        // Pass 3: redescend to the insertion point and splice in the new leaf.
        let root_slot: *mut Option<ChildPtr<V>> = &mut self.root;
        // SAFETY: `root_slot` is a valid, exclusively-owned slot (we hold
        // `&mut self`); `witness_key` stays alive per the comment above.
        unsafe { splice(root_slot, witness_key, key, value, divergence) };
        Ok(())
    }

    /// Exact-key lookup.
    ///
    /// # Safety
    ///
    /// Every key previously inserted must still be backed by a live,
    /// unchanged buffer (see the [`Index`] safety contract). `key` itself has
    /// no liveness requirement beyond the call.
    pub unsafe fn get(&self, key: &[u8]) -> Option<V>
    where
        V: Copy,
    {
        trace!("get: key_len={}", key.len());
        let mut node = self.root?;
        loop {
            match node.classify() {
                ChildRef::Leaf(leaf_ptr) => {
                    // SAFETY: covered by the function's safety contract.
                    let leaf = unsafe { leaf_ptr.as_ref() };
                    // SAFETY: covered by the function's safety contract.
                    return (unsafe { leaf.key() } == key).then_some(leaf.value);
                },
                ChildRef::Inner(inner_ptr) => {
                    // SAFETY: the tree is well-formed; inner nodes are valid
                    // for the lifetime of the index.
                    let inner = unsafe { inner_ptr.as_ref() };
                    let idx = inner.select(key)?;
                    node = inner.child(idx)?;
                },
            }
        }
    }

    /// Exact-key removal, returning the stored value handle.
    ///
    /// # Safety
    ///
    /// Every key previously inserted must still be backed by a live,
    /// unchanged buffer (see the [`Index`] safety contract).
    pub unsafe fn remove(&mut self, key: &[u8]) -> Option<V> {
        trace!("remove: key_len={}", key.len());

        let mut slot: *mut Option<ChildPtr<V>> = &mut self.root;
        // The inner node that owns `*slot` and the index within it
        // (`None` while `slot` is still `self.root`), and the slot holding
        // that owner in turn — the grandparent slot `pp` used to splice in
        // a surviving only-child after elision.
        let mut owner: Option<(NonNull<InnerNode<V>>, usize)> = None;
        let mut owners_slot: Option<*mut Option<ChildPtr<V>>> = None;

        loop {
            // SAFETY: `slot` always points at a live `Option<ChildPtr<V>>`
            // owned by this tree (either `self.root` or a live inner node's
            // child array, both exclusively accessed through `&mut self`).
            let current = unsafe { *slot }?;
            match current.classify() {
                ChildRef::Leaf(leaf_ptr) => {
                    // SAFETY: the leaf is reachable, hence alive.
                    if unsafe { leaf_ptr.as_ref().key() } != key {
                        return None;
                    }

                    match owner {
                        Some((owner_ptr, idx)) => {
                            // SAFETY: `owner_ptr` is live and exclusively
                            // owned through `&mut self`.
                            unsafe { (*owner_ptr.as_ptr()).take_child(idx) };
                        },
                        None => self.root = None,
                    }
                    // SAFETY: `leaf_ptr` was allocated by `LeafNode::allocate`
                    // and is being freed exactly once.
                    let value = unsafe { LeafNode::deallocate(leaf_ptr) };

                    if let (Some((owner_ptr, _)), Some(pp)) = (owner, owners_slot) {
                        // SAFETY: `owner_ptr` is live; `take_child` above
                        // already brought its count up to date.
                        let remaining = unsafe { owner_ptr.as_ref() }.num_children;
                        if remaining == 1 {
                            // SAFETY: same as above.
                            let surviving = unsafe { owner_ptr.as_ref() }.only_child();
                            // SAFETY: `pp` is a live, exclusively-owned slot.
                            unsafe { *pp = Some(surviving) };
                            // SAFETY: `owner_ptr` was allocated by
                            // `InnerNode::allocate`, has no remaining
                            // references after this point, and is being
                            // freed exactly once.
                            unsafe { InnerNode::deallocate(owner_ptr) };
                            debug!("remove: elided inner node with one surviving child");
                        }
                    }

                    return Some(value);
                },
                ChildRef::Inner(inner_ptr) => {
                    // SAFETY: the tree is well-formed; inner nodes are valid
                    // for the lifetime of the index.
                    let idx = unsafe { inner_ptr.as_ref() }.select(key)?;
                    owners_slot = Some(slot);
                    owner = Some((inner_ptr, idx));
                    // SAFETY: `inner_ptr` is live and exclusively owned
                    // through `&mut self`; `idx` is in bounds (`FANOUT`).
                    slot = unsafe { std::ptr::addr_of_mut!((*inner_ptr.as_ptr()).children[idx]) };
                },
            }
        }
    }

    /// Free all internal nodes and leaves. Keys and values are never freed
    /// (they are borrowed). Equivalent to dropping the index; provided for
    /// symmetry with the C lifecycle API this crate replaces.
    pub fn delete(self) {
        drop(self);
    }
}

/// Descend from `root` along `key`'s own nibbles, as in lookup; the moment a
/// selected child slot is empty or `byte_offset` runs past `key`'s length,
/// fall back to any leaf reachable from the current node. This witness
/// shares with `key` a prefix at least as long as the one `key` shares with
/// every leaf in the subtree that would have contained it, which is the
/// property [`diverge`] needs to locate the true divergence coordinate.
///
/// # Safety
///
///  - `root` must be part of a well-formed tree (every reachable inner node
///    has at least one non-empty child, per invariant 2).
unsafe fn find_witness_leaf<V>(mut node: ChildPtr<V>, key: &[u8]) -> NonNull<LeafNode<V>> {
    // Phase 1: follow `key`'s own nibbles, as in lookup.
    loop {
        match node.classify() {
            ChildRef::Leaf(leaf_ptr) => return leaf_ptr,
            ChildRef::Inner(inner_ptr) => {
                // SAFETY: covered by the function's safety docs.
                let inner = unsafe { inner_ptr.as_ref() };
                match inner.select(key).and_then(|idx| inner.child(idx)) {
                    Some(child) => node = child,
                    // The selected slot is empty (or `byte_offset` ran past
                    // `key`'s length): abandon `key`'s own path here and take
                    // any leaf reachable from the current node instead.
                    None => break,
                }
            },
        }
    }

    // Phase 2: `node` is the current (inner) node whose key-selected child
    // was empty; descend via any non-empty child the rest of the way.
    loop {
        match node.classify() {
            ChildRef::Leaf(leaf_ptr) => return leaf_ptr,
            ChildRef::Inner(inner_ptr) => {
                // SAFETY: covered by the function's safety docs.
                node = unsafe { inner_ptr.as_ref() }.any_child();
            },
        }
    }
}

/// Redescend from `slot` along `new_key`, stopping at the insertion point for
/// `divergence`, then splice in a leaf for `new_key` → `value`.
///
/// # Safety
///
///  - `slot` must be a live, exclusively-owned tree slot.
///  - `witness_key` must remain valid for the duration of the call.
///  - `new_key` must remain valid for as long as the resulting leaf stays in
///    the tree.
unsafe fn splice<V>(
    mut slot: *mut Option<ChildPtr<V>>,
    witness_key: &[u8],
    new_key: &[u8],
    value: V,
    divergence: Coordinate,
) {
    loop {
        // SAFETY: covered by the function's safety docs.
        let current = unsafe { *slot };
        match current {
            None => {
                // An unused child slot at or before the divergence point: the
                // divergence nibble happens to be an unused child of an
                // existing node at the same coordinate.
                // SAFETY: `new_key` stays alive per the function's safety docs.
                let leaf = unsafe { LeafNode::new(new_key, value) }.allocate();
                // SAFETY: `slot` is live and exclusively owned.
                unsafe { *slot = Some(ChildPtr::from_leaf(leaf)) };
                debug!("insert: wrote leaf into an empty slot at the divergence coordinate");
                return;
            },
            Some(child) => match child.classify() {
                ChildRef::Leaf(_) => {
                    // SAFETY: covered by the function's safety docs.
                    unsafe {
                        splice_new_inner(slot, child, witness_key, new_key, value, divergence);
                    }
                    return;
                },
                ChildRef::Inner(inner_ptr) => {
                    // SAFETY: the tree is well-formed.
                    let coordinate = unsafe { inner_ptr.as_ref() }.coordinate();
                    if is_earlier(coordinate, divergence) {
                        // SAFETY: `coordinate` earlier than `divergence`
                        // implies its `byte_offset` is within `new_key`'s
                        // length (see `diverge`'s contract).
                        let idx = unsafe { inner_ptr.as_ref() }
                            .select(new_key)
                            .expect("an earlier coordinate must be within the new key's length");
                        // SAFETY: `inner_ptr` is live and exclusively owned.
                        slot = unsafe { std::ptr::addr_of_mut!((*inner_ptr.as_ptr()).children[idx]) };
                    } else {
                        // SAFETY: covered by the function's safety docs.
                        unsafe {
                            splice_new_inner(slot, child, witness_key, new_key, value, divergence);
                        }
                        return;
                    }
                },
            },
        }
    }
}

/// Allocate a new inner node at `divergence`, with `existing_child` and a
/// fresh leaf for `new_key` as its two children, and write it into `slot`.
///
/// # Safety
///
///  - `slot` must be a live, exclusively-owned tree slot currently holding
///    `existing_child`.
///  - `witness_key` and `new_key` must remain valid per [`splice`]'s
///    contract; `witness_key` must agree with every leaf under
///    `existing_child` on all bytes up to and including `divergence.0`.
unsafe fn splice_new_inner<V>(
    slot: *mut Option<ChildPtr<V>>,
    existing_child: ChildPtr<V>,
    witness_key: &[u8],
    new_key: &[u8],
    value: V,
    divergence: Coordinate,
) {
    let (diff_byte, bit_shift) = divergence;
    let existing_idx = usize::from((witness_key[diff_byte as usize] >> bit_shift) & NIBBLE_MASK);
    let new_idx = usize::from((new_key[diff_byte as usize] >> bit_shift) & NIBBLE_MASK);
    debug_assert_ne!(
        existing_idx, new_idx,
        "divergence coordinate must select different nibbles"
    );

    let mut new_node = InnerNode::new(diff_byte, bit_shift);
    new_node.set_child(existing_idx, existing_child);
    // SAFETY: `new_key` stays alive per the function's safety docs.
    let new_leaf = unsafe { LeafNode::new(new_key, value) }.allocate();
    new_node.set_child(new_idx, ChildPtr::from_leaf(new_leaf));

    let new_node_ptr = new_node.allocate();
    // SAFETY: `slot` is live and exclusively owned.
    unsafe { *slot = Some(ChildPtr::from_inner(new_node_ptr)) };
    debug!(
        "insert: allocated new inner node at byte_offset={} bit_shift={}",
        diff_byte, bit_shift
    );
}

impl<V> Drop for Index<V> {
    fn drop(&mut self) {
        // Iterative, explicit work-stack teardown: deep trees are bounded by
        // `key_len * 8 / STRIDE` levels in practice, but recursion depth
        // should never depend on adversarial input.
        let Some(root) = self.root.take() else { return };
        let mut pending = vec![root];
        while let Some(child) = pending.pop() {
            match child.classify() {
                ChildRef::Leaf(leaf_ptr) => {
                    // SAFETY: owned exclusively by this tree, freed exactly once.
                    unsafe {
                        LeafNode::deallocate(leaf_ptr);
                    }
                },
                ChildRef::Inner(inner_ptr) => {
                    // SAFETY: `inner_ptr` is live until we deallocate it below.
                    pending.extend(unsafe { inner_ptr.as_ref() }.children.iter().flatten().copied());
                    // SAFETY: owned exclusively by this tree, freed exactly once.
                    unsafe {
                        InnerNode::deallocate(inner_ptr);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Insert `pairs`, keeping their key buffers alive in `keys` so pointers
    /// handed to `Index` stay valid for the scope of the test.
    fn build(pairs: &[(&[u8], u64)]) -> Index<u64> {
        let mut index = Index::new();
        for &(key, value) in pairs {
            unsafe { index.set(key, value) }.expect("unique keys should insert cleanly");
        }
        index
    }

    /// A 4-byte little-endian length prefix followed by `bytes`, matching the
    /// convention the surrounding cache is expected to use so that no two
    /// distinct keys are ever in a prefix relationship.
    fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + bytes.len());
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
        out
    }

    #[test]
    fn get_after_set_round_trips() {
        let pairs: [(&[u8], u64); 3] = [(b"a", 1), (b"ab", 2), (b"b", 3)];
        let prefixed: Vec<(Vec<u8>, u64)> = pairs.iter().map(|&(k, v)| (length_prefixed(k), v)).collect();
        let owned: Vec<(&[u8], u64)> = prefixed.iter().map(|(k, v)| (k.as_slice(), *v)).collect();
        let index = build(&owned);
        for &(key, value) in &owned {
            assert_eq!(unsafe { index.get(key) }, Some(value));
        }
        assert_eq!(unsafe { index.get(&length_prefixed(b"ac")) }, None);
        assert_eq!(unsafe { index.get(b"") }, None);
    }

    #[test]
    fn set_rejects_duplicate_and_prefix_keys() {
        let mut index: Index<u64> = build(&[(b"ab", 1)]);
        assert_eq!(unsafe { index.set(b"ab", 2) }, Err(IndexError::AlreadyPresent));
        assert_eq!(unsafe { index.set(b"a", 2) }, Err(IndexError::AlreadyPresent));
        assert_eq!(unsafe { index.set(b"abc", 2) }, Err(IndexError::AlreadyPresent));
        assert_eq!(unsafe { index.get(b"ab") }, Some(1));
    }

    #[test]
    fn remove_returns_value_and_forgets_key() {
        let pairs: [(&[u8], u64); 3] = [(b"a", 1), (b"ab", 2), (b"b", 3)];
        let prefixed: Vec<(Vec<u8>, u64)> = pairs.iter().map(|&(k, v)| (length_prefixed(k), v)).collect();
        let owned: Vec<(&[u8], u64)> = prefixed.iter().map(|(k, v)| (k.as_slice(), *v)).collect();
        let mut index = build(&owned);
        let (ab, a, b) = (owned[1].0, owned[0].0, owned[2].0);
        assert_eq!(unsafe { index.remove(ab) }, Some(2));
        assert_eq!(unsafe { index.get(ab) }, None);
        assert_eq!(unsafe { index.get(a) }, Some(1));
        assert_eq!(unsafe { index.get(b) }, Some(3));
        assert_eq!(unsafe { index.remove(ab) }, None);
        assert_eq!(unsafe { index.remove(&length_prefixed(b"nope")) }, None);
    }

    #[test]
    fn remove_elides_single_child_inner_nodes() {
        // "a" and "ab" share an ASCII prefix but, once length-prefixed, diverge
        // in their very first byte; removing "ab" must leave a tree that still
        // reports a miss for any key that would have required the now-elided
        // branch node.
        let a = length_prefixed(b"a");
        let ab = length_prefixed(b"ab");
        let mut index = build(&[(a.as_slice(), 1), (ab.as_slice(), 2)]);
        assert_eq!(unsafe { index.remove(&ab) }, Some(2));
        assert_eq!(unsafe { index.get(&a) }, Some(1));
        assert_eq!(unsafe { index.get(&ab) }, None);
        assert_eq!(unsafe { index.remove(&a) }, Some(1));
        assert_eq!(unsafe { index.get(&a) }, None);
    }

    #[test]
    fn ascii_prefix_keys_scenario() {
        // Mirrors the documented three-key scenario: a shared 4-byte
        // length-prefix header followed by three ASCII strings that agree on
        // every byte but the last.
        let abc = length_prefixed(b"abc");
        let abd = length_prefixed(b"abd");
        let abe = length_prefixed(b"abe");
        let index = build(&[(abc.as_slice(), 1), (abd.as_slice(), 2), (abe.as_slice(), 3)]);

        assert_eq!(unsafe { index.get(&abc) }, Some(1));
        assert_eq!(unsafe { index.get(&abd) }, Some(2));
        assert_eq!(unsafe { index.get(&abe) }, Some(3));
        assert_eq!(unsafe { index.get(&length_prefixed(b"abf")) }, None);
    }

    #[test]
    fn witness_leaf_follows_the_new_keys_own_path() {
        // [0,0,0,0], [0,0,0,1], [0,0,1,0] share a (0,*)/(1,*) prefix; inserting
        // [0,0,1,1] must diverge against its true nearest neighbor
        // [0,0,1,0] at byte 3, not against the leftmost leaf [0,0,0,0] at
        // byte 2 — an arbitrary witness would splice a new node above
        // [0,0,1,0] and shadow it.
        let keys: [[u8; 4]; 4] = [[0, 0, 0, 0], [0, 0, 0, 1], [0, 0, 1, 0], [0, 0, 1, 1]];
        let mut index = Index::new();
        for (i, key) in keys.iter().enumerate() {
            unsafe { index.set(key, i as u64) }.expect("keys are pairwise distinct");
        }
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(unsafe { index.get(key) }, Some(i as u64), "key {key:?} went missing");
        }
    }

    #[test]
    fn big_endian_counter_keys_survive_interleaved_removal() {
        let keys: Vec<[u8; 4]> = (0u32..1024).map(u32::to_be_bytes).collect();
        let pairs: Vec<(&[u8], u64)> = keys.iter().map(|k| (k.as_slice(), 0u64)).collect();
        let mut index = Index::new();
        for (i, &(key, _)) in pairs.iter().enumerate() {
            unsafe { index.set(key, i as u64) }.expect("counter keys are unique");
        }

        for (i, &(key, _)) in pairs.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(unsafe { index.remove(key) }, Some(i as u64));
            }
        }
        for (i, &(key, _)) in pairs.iter().enumerate() {
            let expected = if i % 2 == 0 { None } else { Some(i as u64) };
            assert_eq!(unsafe { index.get(key) }, expected);
        }
    }

    #[test]
    fn no_cross_talk_between_unrelated_keys() {
        let left = length_prefixed(b"left");
        let right = length_prefixed(b"right");
        let leftover = length_prefixed(b"leftover");
        let mut index = build(&[(left.as_slice(), 10), (right.as_slice(), 20)]);
        unsafe { index.set(&leftover, 30) }.expect("distinct key");
        assert_eq!(unsafe { index.get(&left) }, Some(10));
        assert_eq!(unsafe { index.get(&right) }, Some(20));
        assert_eq!(unsafe { index.get(&leftover) }, Some(30));
        assert_eq!(unsafe { index.remove(&left) }, Some(10));
        assert_eq!(unsafe { index.get(&leftover) }, Some(30));
        assert_eq!(unsafe { index.get(&right) }, Some(20));
    }

    #[test]
    fn diverge_rounds_down_to_stride_boundary() {
        assert_eq!(diverge(&[0b0000_0000], &[0b0001_0000]), Some((0, 4)));
        assert_eq!(diverge(&[0b0000_0000], &[0b0000_0001]), Some((0, 0)));
        assert_eq!(diverge(b"same", b"same"), None);
        assert_eq!(diverge(b"a", b"ab"), None);
    }
}

impl<V> Index<V> {
    /// Walk the whole tree and assert invariant 2 (every internal node has
    /// at least two non-empty children) at every level. Test-only: the
    /// public contract deliberately exposes no iteration.
    #[cfg(test)]
    fn assert_minimal(&self) {
        fn walk<V>(node: ChildPtr<V>) {
            if let ChildRef::Inner(inner_ptr) = node.classify() {
                // SAFETY: the tree is well-formed; reachable from `&self`.
                let inner = unsafe { inner_ptr.as_ref() };
                let children: Vec<_> = inner.children.iter().flatten().copied().collect();
                assert!(
                    children.len() >= 2,
                    "internal node at ({}, {}) has {} children, expected >= 2",
                    inner.byte_offset,
                    inner.bit_shift,
                    children.len()
                );
                for child in children {
                    walk(child);
                }
            }
        }
        if let Some(root) = self.root {
            walk(root);
        }
    }
}
