//! # Sorted-Pair Merkle Branches
//!
//! The beacon-chain multi-proof is treated as an opaque sequence of sibling
//! hashes. Folding is position-free: at every level the two children are
//! ordered lexicographically before hashing, so a branch carries no
//! left/right flags.
//!
//! ## Algorithm
//!
//! - Leaf: `SHA256(0x00{12} || proposer_address)`, the address right-aligned
//!   in a 32-byte word.
//! - Node: `SHA256(min(a, b) || max(a, b))`.
//!
//! [`SortedPairTree`] builds the same structure from a leaf set. An odd node
//! at the end of a level is carried up unchanged, which keeps every branch
//! compatible with [`fold_branch`].

use raid_core::{Address, Bytes32};

use crate::error::MerkleError;
use crate::sha256::{sha256, sha256_pair};

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Leaf hash for a claimed proposer address.
pub fn leaf_for_address(address: &Address) -> Bytes32 {
    sha256(address.to_word().as_bytes())
}

/// Hash two nodes with the lexicographically smaller one first.
pub fn hash_sorted_pair(a: &Bytes32, b: &Bytes32) -> Bytes32 {
    if a <= b {
        sha256_pair(a, b)
    } else {
        sha256_pair(b, a)
    }
}

/// Fold `leaf` upward through `branch`, returning the implied root.
///
/// An empty branch returns the leaf itself.
pub fn fold_branch(leaf: &Bytes32, branch: &[Bytes32]) -> Bytes32 {
    branch
        .iter()
        .fold(*leaf, |acc, sibling| hash_sorted_pair(&acc, sibling))
}

// ---------------------------------------------------------------------------
// Tree construction
// ---------------------------------------------------------------------------

/// A fully materialized sorted-pair Merkle tree.
///
/// Used to construct commitments and branches for tests, simulations, and
/// the CLI; verification never needs it.
#[derive(Debug, Clone)]
pub struct SortedPairTree {
    /// `levels[0]` holds the leaves; the last level holds only the root.
    levels: Vec<Vec<Bytes32>>,
}

impl SortedPairTree {
    /// Build a tree over `leaves` in the given order.
    pub fn new(leaves: Vec<Bytes32>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::Empty);
        }
        let mut levels = vec![leaves];
        while let Some(level) = levels.last() {
            if level.len() == 1 {
                break;
            }
            let next: Vec<Bytes32> = level
                .chunks(2)
                .map(|pair| match pair.get(1) {
                    Some(right) => hash_sorted_pair(&pair[0], right),
                    None => pair[0],
                })
                .collect();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// Build a tree whose leaves are the proposer leaves of `addresses`.
    pub fn from_addresses(addresses: &[Address]) -> Result<Self, MerkleError> {
        Self::new(addresses.iter().map(leaf_for_address).collect())
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Whether the tree has no leaves. Always false for a constructed tree.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// The root commitment.
    pub fn root(&self) -> Bytes32 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Bytes32::ZERO)
    }

    /// Sibling hashes from leaf `index` up to the root.
    ///
    /// Levels where the node was carried up without a sibling contribute
    /// nothing to the branch.
    pub fn branch(&self, index: usize) -> Result<Vec<Bytes32>, MerkleError> {
        let len = self.len();
        if index >= len {
            return Err(MerkleError::IndexOutOfRange { index, len });
        }
        let mut pos = index;
        let mut branch = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = pos ^ 1;
            if let Some(hash) = level.get(sibling) {
                branch.push(*hash);
            }
            pos /= 2;
        }
        Ok(branch)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any branch the builder emits folds back to the builder's root.
        #[test]
        fn branch_folds_to_root(
            seeds in prop::collection::vec(any::<[u8; 20]>(), 1..40),
            pick in any::<prop::sample::Index>(),
        ) {
            let addrs: Vec<Address> = seeds.into_iter().map(Address).collect();
            let tree = SortedPairTree::from_addresses(&addrs).unwrap();
            let i = pick.index(addrs.len());
            let branch = tree.branch(i).unwrap();
            prop_assert_eq!(fold_branch(&leaf_for_address(&addrs[i]), &branch), tree.root());
        }

        /// Flipping any bit of any sibling changes the folded root.
        #[test]
        fn tampered_sibling_breaks_fold(
            seeds in prop::collection::vec(any::<[u8; 20]>(), 2..20),
            byte in 0usize..32,
        ) {
            let addrs: Vec<Address> = seeds.into_iter().map(Address).collect();
            let tree = SortedPairTree::from_addresses(&addrs).unwrap();
            let mut branch = tree.branch(0).unwrap();
            prop_assume!(!branch.is_empty());
            branch[0].0[byte] ^= 0x01;
            prop_assert_ne!(fold_branch(&leaf_for_address(&addrs[0]), &branch), tree.root());
        }
    }
}
