//! Ordered distribution store.
//!
//! Accounts are kept in a vector strictly ascending by address, each
//! holding a vector of token entries strictly ascending by token. The
//! vector order is the leaf order of the Merkle trees, so `set` only ever
//! appends and rejects anything that would need a reorder.

use std::collections::HashMap;

use tracing::debug;

use rewardtree_core::{Address, Amount, DistributionError, Result};

/// A single (token, cumulative amount) pair owed to one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub token: Address,
    pub amount: Amount,
}

/// An earner and its tokens, ascending by token address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    address: Address,
    tokens: Vec<TokenEntry>,
}

impl AccountEntry {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn tokens(&self) -> &[TokenEntry] {
        &self.tokens
    }
}

/// Leaf positions assigned by a successful Merklization.
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexTables {
    pub(crate) accounts: HashMap<Address, usize>,
    pub(crate) tokens: HashMap<(Address, Address), usize>,
}

/// Index tables exist only after Merklization.
#[derive(Debug, Clone, Default)]
pub(crate) enum IndexState {
    #[default]
    Unbuilt,
    Built(IndexTables),
}

/// Per-earner, per-token cumulative amounts in tree order.
#[derive(Debug, Clone, Default)]
pub struct Distribution {
    pub(crate) accounts: Vec<AccountEntry>,
    pub(crate) index: IndexState,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `amount` for `(address, token)`.
    ///
    /// `address` must be greater than the last inserted address, or equal
    /// to it with `token` greater than that account's last token. A `None`
    /// amount is stored as zero. On error nothing is modified.
    pub fn set(
        &mut self,
        address: Address,
        token: Address,
        amount: impl Into<Option<Amount>>,
    ) -> Result<()> {
        self.check_append(&address, &token)?;
        let amount = amount.into().unwrap_or_default();

        match self.accounts.last_mut() {
            Some(last) if last.address == address => {
                last.tokens.push(TokenEntry { token, amount });
            }
            _ => self.accounts.push(AccountEntry {
                address,
                tokens: vec![TokenEntry { token, amount }],
            }),
        }
        Ok(())
    }

    /// Whether `(address, token)` may be appended right now.
    pub(crate) fn check_append(&self, address: &Address, token: &Address) -> Result<()> {
        if self.is_merklized() {
            return Err(DistributionError::AlreadyMerklized);
        }
        let Some(last) = self.accounts.last() else {
            return Ok(());
        };
        if *address < last.address {
            return Err(DistributionError::AddressNotInOrder {
                previous: last.address,
                address: *address,
            });
        }
        if *address == last.address {
            if let Some(previous) = last.tokens.last() {
                if *token <= previous.token {
                    return Err(DistributionError::TokenNotInOrder {
                        address: *address,
                        previous: previous.token,
                        token: *token,
                    });
                }
            }
        }
        Ok(())
    }

    /// Amount stored for `(address, token)`, if it was ever set.
    pub fn get(&self, address: &Address, token: &Address) -> Option<&Amount> {
        let account = self.account(address)?;
        let pos = account
            .tokens
            .binary_search_by(|entry| entry.token.cmp(token))
            .ok()?;
        Some(&account.tokens[pos].amount)
    }

    /// Position of `address` in the account tree. `None` before Merklization.
    pub fn get_account_index(&self, address: &Address) -> Option<usize> {
        match &self.index {
            IndexState::Built(tables) => tables.accounts.get(address).copied(),
            IndexState::Unbuilt => None,
        }
    }

    /// Position of `token` in `address`'s token tree. `None` before Merklization.
    pub fn get_token_index(&self, address: &Address, token: &Address) -> Option<usize> {
        match &self.index {
            IndexState::Built(tables) => tables.tokens.get(&(*address, *token)).copied(),
            IndexState::Unbuilt => None,
        }
    }

    pub fn is_merklized(&self) -> bool {
        matches!(self.index, IndexState::Built(_))
    }

    /// Discard the index tables so the distribution can be mutated and
    /// merklized again. Previously issued indices must not be reused.
    pub fn reset_merklization(&mut self) {
        if self.is_merklized() {
            debug!("Discarding index tables for {} accounts", self.accounts.len());
        }
        self.index = IndexState::Unbuilt;
    }

    pub fn account(&self, address: &Address) -> Option<&AccountEntry> {
        let pos = self
            .accounts
            .binary_search_by(|account| account.address.cmp(address))
            .ok()?;
        Some(&self.accounts[pos])
    }

    /// Accounts in tree order.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountEntry> {
        self.accounts.iter()
    }

    pub fn num_accounts(&self) -> usize {
        self.accounts.len()
    }

    /// Total number of (account, token) pairs.
    pub fn num_tokens(&self) -> usize {
        self.accounts.iter().map(|account| account.tokens.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_slice(&[n])
    }

    fn amount(n: u64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn test_set_and_get() {
        let mut d = Distribution::new();
        d.set(addr(69), addr(42), amount(69420)).unwrap();

        assert_eq!(d.get(&addr(69), &addr(42)), Some(&amount(69420)));
        assert_eq!(d.num_accounts(), 1);
        assert_eq!(d.num_tokens(), 1);
    }

    #[test]
    fn test_set_many_ascending() {
        let mut d = Distribution::new();
        for a in 1..=5u8 {
            for t in 1..=(6 - a) {
                d.set(addr(a), addr(t), amount((a + t) as u64)).unwrap();
            }
        }

        for a in 1..=5u8 {
            for t in 1..=(6 - a) {
                assert_eq!(d.get(&addr(a), &addr(t)), Some(&amount((a + t) as u64)));
            }
        }
        assert_eq!(d.num_accounts(), 5);
        assert_eq!(d.num_tokens(), 15);
    }

    #[test]
    fn test_set_none_amount_is_zero() {
        let mut d = Distribution::new();
        d.set(Address::default(), Address::default(), None).unwrap();

        assert_eq!(
            d.get(&Address::default(), &Address::default()),
            Some(&Amount::default())
        );
    }

    #[test]
    fn test_set_addresses_out_of_order() {
        let mut d = Distribution::new();
        d.set(addr(2), addr(1), amount(1)).unwrap();

        let err = d.set(addr(1), addr(1), amount(2)).unwrap_err();
        assert_eq!(
            err,
            DistributionError::AddressNotInOrder {
                previous: addr(2),
                address: addr(1),
            }
        );

        assert_eq!(d.get(&addr(2), &addr(1)), Some(&amount(1)));
        assert_eq!(d.get(&addr(1), &addr(1)), None);
        assert_eq!(d.num_accounts(), 1);
    }

    #[test]
    fn test_set_tokens_out_of_order() {
        let mut d = Distribution::new();
        d.set(addr(1), addr(2), amount(1)).unwrap();

        let err = d.set(addr(1), addr(1), amount(2)).unwrap_err();
        assert!(matches!(err, DistributionError::TokenNotInOrder { .. }));

        assert_eq!(d.get(&addr(1), &addr(2)), Some(&amount(1)));
        assert_eq!(d.get(&addr(1), &addr(1)), None);
        assert_eq!(d.num_tokens(), 1);
    }

    #[test]
    fn test_set_duplicate_pair_rejected() {
        let mut d = Distribution::new();
        d.set(addr(1), addr(1), amount(1)).unwrap();

        let err = d.set(addr(1), addr(1), amount(5)).unwrap_err();
        assert!(matches!(err, DistributionError::TokenNotInOrder { .. }));
        assert_eq!(d.get(&addr(1), &addr(1)), Some(&amount(1)));
    }

    #[test]
    fn test_new_account_may_restart_tokens() {
        let mut d = Distribution::new();
        d.set(addr(1), addr(9), amount(1)).unwrap();
        d.set(addr(2), addr(1), amount(2)).unwrap();
        assert_eq!(d.get(&addr(2), &addr(1)), Some(&amount(2)));
    }

    #[test]
    fn test_get_unset() {
        let d = Distribution::new();
        assert_eq!(d.get(&addr(1), &addr(1)), None);

        let mut d = Distribution::new();
        d.set(addr(1), addr(1), amount(1)).unwrap();
        assert_eq!(d.get(&addr(1), &addr(2)), None);
        assert_eq!(d.get(&addr(3), &addr(1)), None);
    }

    #[test]
    fn test_indices_absent_before_merklization() {
        let mut d = Distribution::new();
        d.set(addr(1), addr(1), amount(1)).unwrap();
        d.set(addr(2), addr(2), amount(1)).unwrap();

        assert!(!d.is_merklized());
        assert_eq!(d.get_account_index(&addr(2)), None);
        assert_eq!(d.get_token_index(&addr(2), &addr(2)), None);
    }

    #[test]
    fn test_accounts_iterate_in_order() {
        let mut d = Distribution::new();
        d.set(addr(1), addr(3), amount(1)).unwrap();
        d.set(addr(1), addr(4), amount(2)).unwrap();
        d.set(addr(5), addr(1), amount(3)).unwrap();

        let order: Vec<(Address, Vec<Address>)> = d
            .accounts()
            .map(|a| (*a.address(), a.tokens().iter().map(|t| t.token).collect()))
            .collect();
        assert_eq!(
            order,
            vec![
                (addr(1), vec![addr(3), addr(4)]),
                (addr(5), vec![addr(1)]),
            ]
        );
    }
}
