use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DistributionError;

pub use num_bigint::BigUint;

/// Length of an earner or token address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Cumulative reward amount. Values routinely exceed 128 bits.
pub type Amount = BigUint;

/// 32-byte Merkle root
pub type Root = [u8; 32];

/// 20-byte earner or token address, ordered byte-lexicographically.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build an address from a byte slice of any length.
    ///
    /// Shorter slices are left-padded with zeros; longer slices keep
    /// their rightmost 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut out = [0u8; ADDRESS_LENGTH];
        if bytes.len() >= ADDRESS_LENGTH {
            out.copy_from_slice(&bytes[bytes.len() - ADDRESS_LENGTH..]);
        } else {
            out[ADDRESS_LENGTH - bytes.len()..].copy_from_slice(bytes);
        }
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = DistributionError;

    /// Parse a 40-digit hex address, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(DistributionError::InvalidAddress(s.to_string()));
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|_| DistributionError::InvalidAddress(s.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_prefix() {
        let a: Address = "0x0D6bA28b9919CfCDb6b233469Cc5Ce30b979e08E".parse().unwrap();
        let b: Address = "0d6ba28b9919cfcdb6b233469cc5ce30b979e08e".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes()[0], 0x0d);
        assert_eq!(a.as_bytes()[19], 0x8e);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz6ba28b9919cfcdb6b233469cc5ce30b979e08e".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        let a: Address = "0x0D6bA28b9919CfCDb6b233469Cc5Ce30b979e08E".parse().unwrap();
        assert_eq!(a.to_string(), "0x0d6ba28b9919cfcdb6b233469cc5ce30b979e08e");
    }

    #[test]
    fn test_from_slice_pads_and_truncates() {
        let short = Address::from_slice(&[69]);
        assert_eq!(short.as_bytes()[19], 69);
        assert!(short.as_bytes()[..19].iter().all(|b| *b == 0));

        let long: Vec<u8> = (0..25u8).collect();
        let addr = Address::from_slice(&long);
        assert_eq!(addr.as_bytes()[0], 5);
        assert_eq!(addr.as_bytes()[19], 24);
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let low = Address::new([0u8; 20]);
        let mut bytes = [0u8; 20];
        bytes[0] = 1;
        let high = Address::new(bytes);
        let mut tail = [0u8; 20];
        tail[19] = 0xff;
        let mid = Address::new(tail);
        assert!(low < mid);
        assert!(mid < high);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let a = Address::new([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
