//! Tree capability traits for pluggable tree backends.
//!
//! The Merklizer is written against `TreeBuilder`/`Tree` only.
//! `MerkleTreeBuilder` is the in-crate backend.

use crate::{Hash, HashFunction, MerkleProof, MerkleTree};

/// Errors from tree construction.
#[derive(Debug, thiserror::Error)]
pub enum MerkleError {
    #[error("Cannot build a tree over zero leaves")]
    EmptyLeaves,

    #[error("Leaf index {index} out of range for {len} leaves")]
    LeafIndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, MerkleError>;

/// A built tree: a root plus the ordered leaves it commits to.
pub trait Tree {
    fn root(&self) -> Hash;

    fn leaf_count(&self) -> usize;

    fn leaf_at(&self, index: usize) -> Option<&[u8]>;

    /// Inclusion proof for the leaf at `index`, `None` if out of range.
    fn proof(&self, index: usize) -> Option<MerkleProof>;
}

/// Pluggable tree construction.
///
/// Implementations receive leaves in their final order and must not
/// reorder them: leaf positions are published as proof indices.
pub trait TreeBuilder: Send + Sync {
    type Tree: Tree;

    fn build(&self, leaves: Vec<Vec<u8>>) -> Result<Self::Tree>;
}

impl Tree for MerkleTree {
    fn root(&self) -> Hash {
        MerkleTree::root(self)
    }

    fn leaf_count(&self) -> usize {
        MerkleTree::leaf_count(self)
    }

    fn leaf_at(&self, index: usize) -> Option<&[u8]> {
        MerkleTree::leaf_at(self, index)
    }

    fn proof(&self, index: usize) -> Option<MerkleProof> {
        MerkleTree::proof(self, index)
    }
}

/// Builds padded binary `MerkleTree`s with a fixed hash function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MerkleTreeBuilder {
    hash: HashFunction,
}

impl MerkleTreeBuilder {
    pub fn new(hash: HashFunction) -> Self {
        Self { hash }
    }

    pub fn hash_function(&self) -> HashFunction {
        self.hash
    }
}

impl TreeBuilder for MerkleTreeBuilder {
    type Tree = MerkleTree;

    fn build(&self, leaves: Vec<Vec<u8>>) -> Result<MerkleTree> {
        MerkleTree::new(self.hash, leaves)
    }
}

/// Fetch a proof or report the index as out of range.
pub fn require_proof<T: Tree + ?Sized>(tree: &T, index: usize) -> Result<MerkleProof> {
    tree.proof(index).ok_or(MerkleError::LeafIndexOutOfRange {
        index,
        len: tree.leaf_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_uses_configured_hash() {
        let leaves = vec![vec![1u8; 53], vec![2u8; 53]];
        let keccak = MerkleTreeBuilder::default().build(leaves.clone()).unwrap();
        let sha = MerkleTreeBuilder::new(HashFunction::Sha256)
            .build(leaves.clone())
            .unwrap();
        assert_eq!(keccak.hash_function(), HashFunction::Keccak256);
        assert_ne!(Tree::root(&keccak), Tree::root(&sha));
        assert_eq!(
            Tree::root(&sha),
            MerkleTree::new(HashFunction::Sha256, leaves).unwrap().root()
        );
    }

    #[test]
    fn test_builder_rejects_empty() {
        assert!(matches!(
            MerkleTreeBuilder::default().build(Vec::new()),
            Err(MerkleError::EmptyLeaves)
        ));
    }

    #[test]
    fn test_require_proof_out_of_range() {
        let tree = MerkleTreeBuilder::default().build(vec![vec![0u8; 4]]).unwrap();
        assert!(require_proof(&tree, 0).is_ok());
        let err = require_proof(&tree, 1).unwrap_err();
        assert_eq!(err.to_string(), "Leaf index 1 out of range for 1 leaves");
    }
}
