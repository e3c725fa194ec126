//! Two-level Merklization.
//!
//! One token tree per account over that account's token leaves, then one
//! account tree over `(address, token_tree_root)` leaves. Leaf positions
//! are recorded into the distribution's index tables, which are only
//! installed once every tree has been built.

use std::collections::BTreeMap;

use tracing::{debug, info};

use rewardtree_core::{
    encode_account_leaf, encode_token_leaf, Address, DistributionError, Result,
};
use rewardtree_merkle::{Hash, MerkleTree, MerkleTreeBuilder, Tree, TreeBuilder};

use crate::store::{IndexState, IndexTables};
use crate::Distribution;

/// The account tree plus each account's token tree.
#[derive(Debug, Clone)]
pub struct Merklization<T> {
    account_tree: T,
    token_trees: BTreeMap<Address, T>,
}

impl<T: Tree> Merklization<T> {
    /// Root of the account tree; the value that gets published.
    pub fn root(&self) -> Hash {
        self.account_tree.root()
    }

    pub fn account_tree(&self) -> &T {
        &self.account_tree
    }

    pub fn token_tree(&self, address: &Address) -> Option<&T> {
        self.token_trees.get(address)
    }

    pub fn token_trees(&self) -> &BTreeMap<Address, T> {
        &self.token_trees
    }
}

impl Distribution {
    /// Merklize with the default Keccak-256 tree.
    pub fn merklize(&mut self) -> Result<Merklization<MerkleTree>> {
        self.merklize_with(&MerkleTreeBuilder::default())
    }

    /// Build both tree levels with `builder` and populate the index tables.
    ///
    /// Fails without touching the index state if the distribution is
    /// empty, an amount overflows its 32-byte slot, the builder fails, or
    /// the distribution was already merklized.
    pub fn merklize_with<B: TreeBuilder>(
        &mut self,
        builder: &B,
    ) -> Result<Merklization<B::Tree>> {
        if self.is_merklized() {
            return Err(DistributionError::AlreadyMerklized);
        }
        if self.accounts.is_empty() {
            return Err(DistributionError::EmptyDistribution);
        }

        let mut tables = IndexTables::default();
        let mut token_trees = BTreeMap::new();
        let mut account_leaves = Vec::with_capacity(self.accounts.len());

        for (account_index, account) in self.accounts.iter().enumerate() {
            let address = *account.address();
            if account.tokens().is_empty() {
                return Err(DistributionError::EmptyAccount(address));
            }

            let mut token_leaves = Vec::with_capacity(account.tokens().len());
            for (token_index, entry) in account.tokens().iter().enumerate() {
                token_leaves.push(encode_token_leaf(&entry.token, &entry.amount)?.to_vec());
                tables.tokens.insert((address, entry.token), token_index);
            }

            let token_tree = builder
                .build(token_leaves)
                .map_err(|e| DistributionError::Tree(e.to_string()))?;
            let token_root = token_tree.root();
            debug!(
                "Built token tree for {}: {} leaves, root={}",
                address,
                token_tree.leaf_count(),
                hex::encode(token_root),
            );

            account_leaves.push(encode_account_leaf(&address, &token_root).to_vec());
            tables.accounts.insert(address, account_index);
            token_trees.insert(address, token_tree);
        }

        let account_tree = builder
            .build(account_leaves)
            .map_err(|e| DistributionError::Tree(e.to_string()))?;

        info!(
            "Merklized distribution: {} accounts, {} tokens, root={}",
            self.accounts.len(),
            tables.tokens.len(),
            hex::encode(account_tree.root()),
        );

        self.index = IndexState::Built(tables);

        Ok(Merklization {
            account_tree,
            token_trees,
        })
    }
}
