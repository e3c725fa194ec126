//! RewardTree Merkle
//!
//! Binary Merkle tree and the capability traits the distribution
//! Merklizer builds against.
//!
//! The Merklizer only ever hands an ordered sequence of leaf bytes to a
//! `TreeBuilder` and reads back the root, so the hash function and the
//! pair-combination rule live entirely in this crate and can be swapped
//! without touching the distribution logic.

pub mod hasher;
pub mod merkle;
pub mod traits;

pub use hasher::HashFunction;
pub use merkle::{Hash, MerkleProof, MerkleTree, ZERO_HASH};
pub use traits::{require_proof, MerkleError, MerkleTreeBuilder, Result, Tree, TreeBuilder};
