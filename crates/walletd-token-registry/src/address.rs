//! Normalized chain address

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use walletd_error::ValidationError;

/// A 20-byte EVM account address parsed once at ingestion.
///
/// Input of any letter case is accepted; equality, ordering and hashing are
/// by value, so `0xABC…` and `0xabc…` are the same key. Displays and
/// serializes as lowercase `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChainAddress(Address);

impl ChainAddress {
    /// The all-zero address
    pub const ZERO: ChainAddress = ChainAddress(Address::ZERO);

    /// Parses `0x` followed by exactly 40 hex digits. Checksums are not
    /// enforced.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| invalid("missing 0x prefix"))?;
        if digits.len() != 40 {
            return Err(invalid("expected 40 hex digits"));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self(Address::from(bytes)))
    }

    /// Returns the underlying alloy address
    pub fn as_address(&self) -> Address {
        self.0
    }

    /// Lowercase hex form with `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }

    /// EIP-55 checksummed form, for display next to explorers and wallets
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<Address> for ChainAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl From<ChainAddress> for Address {
    fn from(address: ChainAddress) -> Self {
        address.0
    }
}

impl FromStr for ChainAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ChainAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9";

    #[test]
    fn test_parse_normalizes_case() {
        let mixed = ChainAddress::parse(MIXED).unwrap();
        let lower = ChainAddress::parse(&MIXED.to_lowercase()).unwrap();
        let upper = ChainAddress::parse(&format!("0x{}", MIXED[2..].to_uppercase())).unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
        assert_eq!(mixed.to_string(), MIXED.to_lowercase());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "0x",
            "742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5",
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb900",
        ] {
            assert!(ChainAddress::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let addr = ChainAddress::parse(&format!("  {MIXED}\n")).unwrap();
        assert_eq!(addr.to_hex(), MIXED.to_lowercase());
    }

    #[test]
    fn test_checksum_form() {
        let addr = ChainAddress::parse(&MIXED.to_lowercase()).unwrap();
        let checksummed = addr.to_checksum();
        assert_eq!(checksummed.to_lowercase(), MIXED.to_lowercase());
        assert_eq!(ChainAddress::parse(&checksummed).unwrap(), addr);
    }

    #[test]
    fn test_serde_lowercase() {
        let addr = ChainAddress::parse(MIXED).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", MIXED.to_lowercase()));
        let back: ChainAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<ChainAddress>("\"0x1234\"").is_err());
    }

    #[test]
    fn test_alloy_conversion() {
        let alloy_addr: Address = MIXED.parse().unwrap();
        let addr = ChainAddress::from(alloy_addr);
        assert_eq!(Address::from(addr), alloy_addr);
    }
}
