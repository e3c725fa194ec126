//! Salted leaf encoding for the two tree levels.
//!
//! Token leaf:   `[TOKEN_LEAF_SALT:1][token:20][amount_be:32]`
//! Account leaf: `[ACCOUNT_LEAF_SALT:1][earner:20][token_root:32]`
//!
//! This layout MUST match every verifier that checks proofs against the
//! same root. Do not reorder fields or change the salts.

use crate::{Address, Amount, DistributionError, Result, Root, ADDRESS_LENGTH};

/// Prefix byte of an account (earner) leaf.
pub const ACCOUNT_LEAF_SALT: u8 = 0x00;

/// Prefix byte of a token leaf.
pub const TOKEN_LEAF_SALT: u8 = 0x01;

/// Both leaf kinds are 1 + 20 + 32 bytes.
pub const LEAF_LENGTH: usize = 1 + ADDRESS_LENGTH + 32;

/// Encode an account leaf from an earner address and its token tree root.
pub fn encode_account_leaf(address: &Address, token_root: &Root) -> [u8; LEAF_LENGTH] {
    let mut leaf = [0u8; LEAF_LENGTH];
    leaf[0] = ACCOUNT_LEAF_SALT;
    leaf[1..1 + ADDRESS_LENGTH].copy_from_slice(address.as_bytes());
    leaf[1 + ADDRESS_LENGTH..].copy_from_slice(token_root);
    leaf
}

/// Encode a token leaf from a token address and a cumulative amount.
///
/// Fails with `AmountOverflow` if the amount needs more than 256 bits.
pub fn encode_token_leaf(token: &Address, amount: &Amount) -> Result<[u8; LEAF_LENGTH]> {
    let amount_bytes = amount_to_be_bytes32(amount)?;
    let mut leaf = [0u8; LEAF_LENGTH];
    leaf[0] = TOKEN_LEAF_SALT;
    leaf[1..1 + ADDRESS_LENGTH].copy_from_slice(token.as_bytes());
    leaf[1 + ADDRESS_LENGTH..].copy_from_slice(&amount_bytes);
    Ok(leaf)
}

/// Left-pad an amount into a 32-byte big-endian word.
pub fn amount_to_be_bytes32(amount: &Amount) -> Result<[u8; 32]> {
    let bits = amount.bits();
    if bits > 256 {
        return Err(DistributionError::AmountOverflow { bits });
    }
    let bytes = amount.to_bytes_be();
    let mut out = [0u8; 32];
    // to_bytes_be() yields [0] for zero, which still fits
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}
