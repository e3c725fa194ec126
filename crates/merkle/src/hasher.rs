//! Hash function selection.

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::Hash;

/// Hash used for both leaf hashing and parent nodes.
///
/// Keccak-256 is what EVM verifiers recompute, so it is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashFunction {
    #[default]
    Keccak256,
    Sha256,
}

impl HashFunction {
    /// Hash an arbitrary byte string.
    pub fn hash(&self, data: &[u8]) -> Hash {
        match self {
            Self::Keccak256 => digest::<Keccak256>(&[data]),
            Self::Sha256 => digest::<Sha256>(&[data]),
        }
    }

    /// Hash two child nodes to produce a parent: `H(left || right)`.
    pub fn hash_pair(&self, left: &Hash, right: &Hash) -> Hash {
        match self {
            Self::Keccak256 => digest::<Keccak256>(&[&left[..], &right[..]]),
            Self::Sha256 => digest::<Sha256>(&[&left[..], &right[..]]),
        }
    }
}

fn digest<D: Digest>(parts: &[&[u8]]) -> Hash {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}
