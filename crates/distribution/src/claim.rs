//! Claim bundles.
//!
//! A claim proves one earner's cumulative amounts for a set of tokens
//! against the published root: an account-tree proof for the earner leaf
//! plus one token-tree proof per token leaf.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use rewardtree_core::{encode_account_leaf, encode_token_leaf, Address, Amount};
use rewardtree_merkle::{require_proof, Hash, HashFunction, MerkleError, MerkleProof, MerkleTree};

use crate::{Distribution, Merklization};

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Distribution has not been merklized")]
    NotMerklized,

    #[error("Earner {0} is not in the distribution")]
    EarnerNotFound(Address),

    #[error("Token {token} not found for earner {earner}")]
    TokenNotFound { earner: Address, token: Address },

    #[error("Claim must name at least one token")]
    EmptyTokenList,

    #[error("Merklization does not match the distribution for earner {0}")]
    StaleMerklization(Address),

    #[error(transparent)]
    Tree(#[from] MerkleError),
}

/// Sibling hashes, leaf level first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofPath(#[serde(with = "hex_hashes")] pub Vec<Hash>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnerTreeLeaf {
    pub earner: Address,
    #[serde(with = "hex_hash")]
    pub earner_token_root: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTreeLeaf {
    pub token: Address,
    #[serde(with = "decimal")]
    pub cumulative_earnings: Amount,
}

/// Everything a verifier needs to check an earner's amounts offline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub hash_function: HashFunction,
    #[serde(with = "hex_hash")]
    pub root: Hash,
    pub earner_index: usize,
    pub earner_tree_proof: ProofPath,
    pub earner_leaf: EarnerTreeLeaf,
    pub token_indices: Vec<usize>,
    pub token_tree_proofs: Vec<ProofPath>,
    pub token_leaves: Vec<TokenTreeLeaf>,
}

impl Claim {
    /// Recompute every root from the leaves and proofs in the claim.
    ///
    /// True only if each token leaf folds to `earner_token_root` and the
    /// earner leaf folds to `root`.
    pub fn check(&self) -> bool {
        let n = self.token_leaves.len();
        if n == 0 || self.token_indices.len() != n || self.token_tree_proofs.len() != n {
            return false;
        }

        for ((leaf, &leaf_index), path) in self
            .token_leaves
            .iter()
            .zip(&self.token_indices)
            .zip(&self.token_tree_proofs)
        {
            let Ok(bytes) = encode_token_leaf(&leaf.token, &leaf.cumulative_earnings) else {
                return false;
            };
            let proof = MerkleProof {
                siblings: path.0.clone(),
                leaf_index,
            };
            if !proof.verify(self.hash_function, &self.earner_leaf.earner_token_root, &bytes) {
                return false;
            }
        }

        let account_leaf =
            encode_account_leaf(&self.earner_leaf.earner, &self.earner_leaf.earner_token_root);
        let proof = MerkleProof {
            siblings: self.earner_tree_proof.0.clone(),
            leaf_index: self.earner_index,
        };
        proof.verify(self.hash_function, &self.root, &account_leaf)
    }
}

/// Build a claim for `earner` covering `tokens`, in the order given.
pub fn generate_claim(
    distribution: &Distribution,
    merklization: &Merklization<MerkleTree>,
    earner: Address,
    tokens: &[Address],
) -> Result<Claim, ClaimError> {
    if tokens.is_empty() {
        return Err(ClaimError::EmptyTokenList);
    }
    if !distribution.is_merklized() {
        return Err(ClaimError::NotMerklized);
    }

    let earner_index = distribution
        .get_account_index(&earner)
        .ok_or(ClaimError::EarnerNotFound(earner))?;
    let token_tree = merklization
        .token_tree(&earner)
        .ok_or(ClaimError::EarnerNotFound(earner))?;
    let account_tree = merklization.account_tree();

    let earner_token_root = token_tree.root();
    let expected_leaf = encode_account_leaf(&earner, &earner_token_root);
    if account_tree.leaf_at(earner_index) != Some(&expected_leaf[..]) {
        return Err(ClaimError::StaleMerklization(earner));
    }
    let earner_proof = require_proof(account_tree, earner_index)?;

    let mut token_indices = Vec::with_capacity(tokens.len());
    let mut token_tree_proofs = Vec::with_capacity(tokens.len());
    let mut token_leaves = Vec::with_capacity(tokens.len());
    for token in tokens {
        let not_found = || ClaimError::TokenNotFound {
            earner,
            token: *token,
        };
        let index = distribution.get_token_index(&earner, token).ok_or_else(not_found)?;
        let amount = distribution.get(&earner, token).ok_or_else(not_found)?;

        let leaf = encode_token_leaf(token, amount)
            .map_err(|_| ClaimError::StaleMerklization(earner))?;
        if token_tree.leaf_at(index) != Some(&leaf[..]) {
            return Err(ClaimError::StaleMerklization(earner));
        }
        let proof = require_proof(token_tree, index)?;

        token_indices.push(index);
        token_tree_proofs.push(ProofPath(proof.siblings));
        token_leaves.push(TokenTreeLeaf {
            token: *token,
            cumulative_earnings: amount.clone(),
        });
    }

    debug!(
        "Generated claim for {} at index {} with {} tokens",
        earner,
        earner_index,
        tokens.len(),
    );

    Ok(Claim {
        hash_function: account_tree.hash_function(),
        root: account_tree.root(),
        earner_index,
        earner_tree_proof: ProofPath(earner_proof.siblings),
        earner_leaf: EarnerTreeLeaf {
            earner,
            earner_token_root,
        },
        token_indices,
        token_tree_proofs,
        token_leaves,
    })
}

fn decode_hash(s: &str) -> Result<Hash, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))
}

mod hex_hash {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(hash)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hash(&s).map_err(serde::de::Error::custom)
    }
}

mod hex_hashes {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hashes: &[Hash], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(hashes.iter().map(|h| format!("0x{}", hex::encode(h))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Hash>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| decode_hash(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

mod decimal {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::parse_amount(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_slice(&[n])
    }

    fn merklized() -> (Distribution, Merklization<MerkleTree>) {
        let mut d = Distribution::new();
        for a in 1..=5u8 {
            for t in 1..=(6 - a) {
                d.set(addr(a), addr(t), Amount::from((a as u64) * 100 + t as u64))
                    .unwrap();
            }
        }
        let m = d.merklize().unwrap();
        (d, m)
    }

    #[test]
    fn test_claim_checks() {
        let (d, m) = merklized();
        let claim = generate_claim(&d, &m, addr(2), &[addr(1), addr(3), addr(4)]).unwrap();

        assert_eq!(claim.root, m.root());
        assert_eq!(claim.earner_index, 1);
        assert_eq!(claim.token_indices, vec![0, 2, 3]);
        assert_eq!(claim.token_leaves[1].cumulative_earnings, Amount::from(203u32));
        assert!(claim.check());
    }

    #[test]
    fn test_every_claim_checks() {
        let (d, m) = merklized();
        for account in d.accounts() {
            let tokens: Vec<Address> = account.tokens().iter().map(|t| t.token).collect();
            let claim = generate_claim(&d, &m, *account.address(), &tokens).unwrap();
            assert!(claim.check(), "claim for {} failed", account.address());
        }
    }

    #[test]
    fn test_tampered_claim_fails() {
        let (d, m) = merklized();
        let claim = generate_claim(&d, &m, addr(3), &[addr(2)]).unwrap();

        let mut inflated = claim.clone();
        inflated.token_leaves[0].cumulative_earnings += 1u32;
        assert!(!inflated.check());

        let mut moved = claim.clone();
        moved.earner_index = 0;
        assert!(!moved.check());

        let mut other_root = claim.clone();
        other_root.root = [7u8; 32];
        assert!(!other_root.check());

        let mut truncated = claim;
        truncated.token_indices.clear();
        assert!(!truncated.check());
    }

    #[test]
    fn test_out_of_range_indices_fail() {
        let (d, m) = merklized();
        let claim = generate_claim(&d, &m, addr(2), &[addr(1)]).unwrap();
        assert!(claim.check());

        // Same low bits as the real positions, so the fold alone still matches
        let mut aliased_earner = claim.clone();
        aliased_earner.earner_index += 8;
        assert!(!aliased_earner.check());

        let mut aliased_token = claim;
        aliased_token.token_indices[0] += 1024;
        assert!(!aliased_token.check());
    }

    #[test]
    fn test_stale_merklization_rejected() {
        let (_, m) = merklized();

        // Same shape, different amount for earner 1
        let mut changed = Distribution::new();
        for a in 1..=5u8 {
            for t in 1..=(6 - a) {
                let amount = if a == 1 { 1 } else { (a as u64) * 100 + t as u64 };
                changed.set(addr(a), addr(t), Amount::from(amount)).unwrap();
            }
        }
        changed.merklize().unwrap();

        assert!(matches!(
            generate_claim(&changed, &m, addr(1), &[addr(2)]),
            Err(ClaimError::StaleMerklization(a)) if a == addr(1)
        ));
        assert!(generate_claim(&changed, &m, addr(2), &[addr(2)]).unwrap().check());
    }

    #[test]
    fn test_claim_errors() {
        let (d, m) = merklized();
        assert!(matches!(
            generate_claim(&d, &m, addr(1), &[]),
            Err(ClaimError::EmptyTokenList)
        ));
        assert!(matches!(
            generate_claim(&d, &m, addr(9), &[addr(1)]),
            Err(ClaimError::EarnerNotFound(a)) if a == addr(9)
        ));
        assert!(matches!(
            generate_claim(&d, &m, addr(5), &[addr(2)]),
            Err(ClaimError::TokenNotFound { .. })
        ));

        let mut unmerklized = d.clone();
        unmerklized.reset_merklization();
        assert!(matches!(
            generate_claim(&unmerklized, &m, addr(1), &[addr(1)]),
            Err(ClaimError::NotMerklized)
        ));
    }

    #[test]
    fn test_claim_json() {
        let (d, m) = merklized();
        let claim = generate_claim(&d, &m, addr(4), &[addr(2)]).unwrap();

        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["hash_function"], "keccak256");
        assert_eq!(json["token_leaves"][0]["cumulative_earnings"], "402");
        assert!(json["root"].as_str().unwrap().starts_with("0x"));
        assert_eq!(json["earner_tree_proof"].as_array().unwrap().len(), 3);

        let parsed: Claim = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, claim);
        assert!(parsed.check());
    }
}
