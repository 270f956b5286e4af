//! Binary trie backing.
//!
//! Each level of the trie consumes one bit of the [`AddressKey`], most
//! significant first, so addresses that share a prefix share the upper nodes.
//! Memory grows with the number of distinct prefixes inserted rather than with
//! the size of the address space.
//!
//! Nodes live in a `Vec` arena and refer to their children by `u32` index.
//! The root is always index 0, so 0 in a child slot means "absent". The last
//! level is not materialised: a depth-31 node marks an inserted address by
//! storing [`LEAF`] in the slot for its final bit. This keeps the arena at
//! most `2^32 - 1` nodes, all addressable by `u32`.

use std::fmt;

use crate::codec::{AddressKey, ADDRESS_BITS};
use crate::MembershipSet;

// =============================================================================
// Node arena
// =============================================================================

/// Arena index of a node.
pub(crate) type NodeId = u32;

pub(crate) const ROOT: NodeId = 0;

/// Empty child slot. Never a valid child since the root is nobody's child.
pub(crate) const ABSENT: NodeId = 0;

/// Child slot tag for a present depth-32 leaf.
pub(crate) const LEAF: NodeId = NodeId::MAX;

/// An internal trie node: `children[0]` is the `zero` slot, `children[1]` the
/// `one` slot. Nodes carry no payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TrieNode {
    pub(crate) children: [NodeId; 2],
}

/// Bit of `key` consumed at `depth` (depth 0 reads bit 31).
#[inline]
fn bit_at(key: AddressKey, depth: u32) -> usize {
    debug_assert!(depth < ADDRESS_BITS);
    ((key >> (ADDRESS_BITS - 1 - depth)) & 1) as usize
}

// =============================================================================
// BinaryTrieSet
// =============================================================================

/// A set of IPv4 addresses stored as a depth-32 binary trie.
///
/// A full root-to-leaf path exists for an address iff it has been inserted.
/// Nodes are never removed.
#[derive(Clone)]
pub struct BinaryTrieSet {
    pub(crate) nodes: Vec<TrieNode>,
    unique_count: u64,
}

impl BinaryTrieSet {
    /// An empty trie holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            unique_count: 0,
        }
    }

    /// Number of logical trie nodes, counting the root and one per leaf.
    pub fn node_count(&self) -> u64 {
        self.nodes.len() as u64 + self.unique_count
    }

    /// Release spare arena capacity.
    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    fn alloc_node(&mut self) -> NodeId {
        // Only depths 0..=31 are materialised, at most 2^32 - 1 nodes, so the
        // next index is always below LEAF.
        let id = self.nodes.len() as NodeId;
        debug_assert_ne!(id, LEAF);
        self.nodes.push(TrieNode::default());
        id
    }

    /// Walk the internal levels for `key`, returning the depth-31 node, or
    /// `None` as soon as a slot is absent.
    #[inline]
    fn find_last_internal(&self, key: AddressKey) -> Option<NodeId> {
        let mut node = ROOT;
        for depth in 0..ADDRESS_BITS - 1 {
            let child = self.nodes[node as usize].children[bit_at(key, depth)];
            if child == ABSENT {
                return None;
            }
            node = child;
        }
        Some(node)
    }
}

impl MembershipSet for BinaryTrieSet {
    fn insert_key(&mut self, key: AddressKey) -> bool {
        let mut node = ROOT;
        for depth in 0..ADDRESS_BITS - 1 {
            let bit = bit_at(key, depth);
            let child = self.nodes[node as usize].children[bit];
            node = if child == ABSENT {
                let id = self.alloc_node();
                self.nodes[node as usize].children[bit] = id;
                id
            } else {
                child
            };
        }

        let slot = &mut self.nodes[node as usize].children[bit_at(key, ADDRESS_BITS - 1)];
        if *slot == LEAF {
            return false;
        }
        *slot = LEAF;
        self.unique_count += 1;
        true
    }

    fn search_key(&self, key: AddressKey) -> bool {
        self.find_last_internal(key)
            .is_some_and(|node| self.nodes[node as usize].children[bit_at(key, ADDRESS_BITS - 1)] == LEAF)
    }

    #[inline]
    fn unique_count(&self) -> u64 {
        self.unique_count
    }

    fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<TrieNode>()
    }
}

impl Default for BinaryTrieSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BinaryTrieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryTrieSet")
            .field("unique_count", &self.unique_count)
            .field("arena_nodes", &self.nodes.len())
            .finish()
    }
}
