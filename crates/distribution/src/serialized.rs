//! JSON snapshot of a distribution.
//!
//! Amounts are written as decimal strings so values beyond 64 bits survive
//! any JSON reader. Loading replays every pair through `set`, so a
//! document that is out of order fails the same way a bad `set` would.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use rewardtree_core::{Address, DistributionError};

use crate::amount::{parse_amount, AmountParseError};
use crate::Distribution;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedToken {
    pub token: Address,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAccount {
    pub address: Address,
    pub tokens: Vec<SerializedToken>,
}

/// Serde form of a `Distribution`, accounts and tokens in tree order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedDistribution {
    pub accounts: Vec<SerializedAccount>,
}

#[derive(Error, Debug)]
pub enum SerializedError {
    #[error("Invalid amount {value:?} for earner {address} token {token}: {source}")]
    InvalidAmount {
        address: Address,
        token: Address,
        value: String,
        source: AmountParseError,
    },

    #[error("Malformed distribution at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

impl From<serde_json::Error> for SerializedError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            line: source.line(),
            source,
        }
    }
}

impl Distribution {
    pub fn to_serialized(&self) -> SerializedDistribution {
        SerializedDistribution {
            accounts: self
                .accounts()
                .map(|account| SerializedAccount {
                    address: *account.address(),
                    tokens: account
                        .tokens()
                        .iter()
                        .map(|entry| SerializedToken {
                            token: entry.token,
                            amount: entry.amount.to_str_radix(10),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Rebuild a distribution from its serialized form.
    ///
    /// The result is unmerklized. Accounts without tokens are rejected
    /// since they could never be merklized.
    pub fn from_serialized(data: &SerializedDistribution) -> Result<Self, SerializedError> {
        let mut distribution = Self::new();
        for account in &data.accounts {
            if account.tokens.is_empty() {
                return Err(DistributionError::EmptyAccount(account.address).into());
            }
            for entry in &account.tokens {
                let amount =
                    parse_amount(&entry.amount).map_err(|source| SerializedError::InvalidAmount {
                        address: account.address,
                        token: entry.token,
                        value: entry.amount.clone(),
                        source,
                    })?;
                distribution.set(account.address, entry.token, amount)?;
            }
        }
        debug!(
            "Loaded distribution: {} accounts, {} tokens",
            distribution.num_accounts(),
            distribution.num_tokens(),
        );
        Ok(distribution)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, SerializedError> {
        let data = self.to_serialized();
        let json = if pretty {
            serde_json::to_string_pretty(&data)?
        } else {
            serde_json::to_string(&data)?
        };
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<Self, SerializedError> {
        let data: SerializedDistribution = serde_json::from_str(json)?;
        Self::from_serialized(&data)
    }

    /// Write the snapshot through a temp file and rename it into place.
    pub fn save_to_file(&self, path: &Path, pretty: bool) -> Result<(), SerializedError> {
        let json = self.to_json(pretty)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, path)?;

        info!(
            "Saved distribution: {} accounts, {} tokens to {}",
            self.num_accounts(),
            self.num_tokens(),
            path.display(),
        );
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SerializedError> {
        let contents = std::fs::read_to_string(path)?;
        let distribution = Self::from_json(&contents)?;
        info!(
            "Loaded distribution from {}: {} accounts",
            path.display(),
            distribution.num_accounts(),
        );
        Ok(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewardtree_core::Amount;

    fn addr(n: u8) -> Address {
        Address::from_slice(&[n])
    }

    fn sample() -> Distribution {
        let mut d = Distribution::new();
        d.set(addr(1), addr(1), Amount::from(1u32)).unwrap();
        d.set(addr(1), addr(2), "2690822691000000000000000000".parse::<Amount>().unwrap())
            .unwrap();
        d.set(addr(2), addr(1), Amount::from(2u32)).unwrap();
        d
    }

    #[test]
    fn test_serialized_shape() {
        let json = sample().to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let accounts = value["accounts"].as_array().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(
            accounts[0]["address"],
            "0x0000000000000000000000000000000000000001"
        );
        assert_eq!(accounts[0]["tokens"][1]["amount"], "2690822691000000000000000000");
        assert_eq!(
            accounts[1]["tokens"][0]["token"],
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_reload_same_root() {
        let mut original = sample();
        let json = original.to_json(true).unwrap();
        let root = original.merklize().unwrap().root();

        let mut reloaded = Distribution::from_json(&json).unwrap();
        assert!(!reloaded.is_merklized());
        assert_eq!(reloaded.merklize().unwrap().root(), root);
    }

    #[test]
    fn test_out_of_order_document_rejected() {
        let json = r#"{"accounts":[
            {"address":"0x0000000000000000000000000000000000000002","tokens":[{"token":"0x0000000000000000000000000000000000000001","amount":"1"}]},
            {"address":"0x0000000000000000000000000000000000000001","tokens":[{"token":"0x0000000000000000000000000000000000000001","amount":"1"}]}
        ]}"#;
        let err = Distribution::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            SerializedError::Distribution(DistributionError::AddressNotInOrder { .. })
        ));
    }

    #[test]
    fn test_empty_account_rejected() {
        let json = r#"{"accounts":[{"address":"0x0000000000000000000000000000000000000009","tokens":[]}]}"#;
        let err = Distribution::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            SerializedError::Distribution(DistributionError::EmptyAccount(a)) if a == addr(9)
        ));
    }

    #[test]
    fn test_bad_amount_rejected() {
        let json = r#"{"accounts":[{"address":"0x0000000000000000000000000000000000000001","tokens":[{"token":"0x0000000000000000000000000000000000000001","amount":"-5"}]}]}"#;
        let err = Distribution::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            SerializedError::InvalidAmount { source: AmountParseError::Negative, .. }
        ));
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let err = Distribution::from_json("{\n\"accounts\": [\n}").unwrap_err();
        assert!(matches!(err, SerializedError::Json { line: 3, .. }));
    }
}
