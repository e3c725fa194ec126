//! Binary Merkle tree for distribution proofs.
//!
//! Leaf nodes: `H(leaf_bytes)`.
//! Internal nodes: `H(left || right)`.
//! If the leaf count is not a power of 2, pad with `[0u8; 32]`.

use crate::{HashFunction, MerkleError, Result};

/// 32-byte node hash
pub type Hash = [u8; 32];

/// Padding node for non power-of-two leaf layers.
pub const ZERO_HASH: Hash = [0u8; 32];

/// A Merkle proof consisting of sibling hashes along the path to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling hashes from leaf level to root (bottom-up).
    pub siblings: Vec<Hash>,
    /// Index of the leaf in the tree (determines left/right at each level).
    pub leaf_index: usize,
}

impl MerkleProof {
    /// Fold the proof over the raw leaf bytes and return the implied root.
    pub fn compute_root(&self, hash: HashFunction, leaf: &[u8]) -> Hash {
        let mut current = hash.hash(leaf);
        let mut idx = self.leaf_index;

        for sibling in &self.siblings {
            current = if idx % 2 == 0 {
                hash.hash_pair(&current, sibling)
            } else {
                hash.hash_pair(sibling, &current)
            };
            idx /= 2;
        }

        current
    }

    /// Whether `leaf_index` addresses a position in a tree of this depth.
    ///
    /// The fold only reads the low `siblings.len()` bits of the index, so a
    /// larger index would alias a real position.
    pub fn index_in_range(&self) -> bool {
        match self.leaf_index.checked_shr(self.siblings.len() as u32) {
            Some(high) => high == 0,
            None => true,
        }
    }

    /// Verify the proof against a root and the raw leaf bytes.
    pub fn verify(&self, hash: HashFunction, root: &Hash, leaf: &[u8]) -> bool {
        self.index_in_range() && self.compute_root(hash, leaf) == *root
    }
}

/// A binary Merkle tree that keeps its original leaf data.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    hash: HashFunction,
    /// Leaf data in insertion order (unpadded).
    data: Vec<Vec<u8>>,
    /// All nodes stored level by level, bottom-up. `layers[0]` = hashed leaves.
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over the given leaves.
    ///
    /// Fails with `EmptyLeaves` when there is nothing to commit to; a root
    /// over zero leaves would be indistinguishable from padding.
    pub fn new(hash: HashFunction, leaves: Vec<Vec<u8>>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyLeaves);
        }

        let padded_len = leaves.len().next_power_of_two();
        let mut bottom: Vec<Hash> = leaves.iter().map(|leaf| hash.hash(leaf)).collect();
        bottom.resize(padded_len, ZERO_HASH);

        let mut layers = vec![bottom];

        // Build tree bottom-up
        loop {
            let prev = &layers[layers.len() - 1];
            if prev.len() <= 1 {
                break;
            }
            let next_layer: Vec<Hash> = prev
                .chunks(2)
                .map(|pair| hash.hash_pair(&pair[0], &pair[1]))
                .collect();
            layers.push(next_layer);
        }

        Ok(Self {
            hash,
            data: leaves,
            layers,
        })
    }

    /// Get the Merkle root.
    pub fn root(&self) -> Hash {
        // new() guarantees at least one non-empty layer
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(ZERO_HASH)
    }

    /// Generate a proof for the leaf at the given index.
    ///
    /// Returns `None` if the index is not one of the original leaves.
    pub fn proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.data.len() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.layers.len() - 1);
        let mut idx = leaf_index;

        for layer in &self.layers[..self.layers.len() - 1] {
            // Sibling is the other child of the same parent
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            siblings.push(layer[sibling_idx]);
            idx /= 2;
        }

        Some(MerkleProof {
            siblings,
            leaf_index,
        })
    }

    /// Original leaf data, in order.
    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.data
    }

    pub fn leaf_at(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Number of original (unpadded) leaves.
    pub fn leaf_count(&self) -> usize {
        self.data.len()
    }

    /// Number of leaves including padding.
    pub fn padded_leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of sibling hashes in every proof from this tree.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn hash_function(&self) -> HashFunction {
        self.hash
    }
}
