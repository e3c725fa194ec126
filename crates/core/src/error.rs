use thiserror::Error;

use crate::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributionError {
    #[error("Address not in order: {address} must be greater than {previous}")]
    AddressNotInOrder { previous: Address, address: Address },

    #[error("Token not in order for {address}: {token} must be greater than {previous}")]
    TokenNotInOrder {
        address: Address,
        previous: Address,
        token: Address,
    },

    #[error("Distribution already merklized; reset it before mutating or merklizing again")]
    AlreadyMerklized,

    #[error("Cannot merklize an empty distribution")]
    EmptyDistribution,

    #[error("Account {0} has no tokens")]
    EmptyAccount(Address),

    #[error("Amount of {bits} bits does not fit in 32 bytes")]
    AmountOverflow { bits: u64 },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Tree construction failed: {0}")]
    Tree(String),
}

impl DistributionError {
    /// Whether this is an ordering violation on either axis.
    pub fn is_ordering_violation(&self) -> bool {
        matches!(
            self,
            Self::AddressNotInOrder { .. } | Self::TokenNotInOrder { .. }
        )
    }

    /// Whether this error comes from building a tree over zero leaves.
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, Self::EmptyDistribution | Self::EmptyAccount(_))
    }
}

pub type Result<T> = std::result::Result<T, DistributionError>;
