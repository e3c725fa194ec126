//! RewardTree Core Types
//!
//! Addresses, amounts, the error taxonomy and the salted leaf encoding
//! shared by every RewardTree crate.

mod error;
pub mod leaf;
mod types;

pub use error::*;
pub use leaf::{
    amount_to_be_bytes32, encode_account_leaf, encode_token_leaf, ACCOUNT_LEAF_SALT, LEAF_LENGTH,
    TOKEN_LEAF_SALT,
};
pub use types::*;
