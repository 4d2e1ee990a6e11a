//! Token records and metadata

use crate::address::ChainAddress;
use alloy::primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use walletd_error::ValidationError;

/// Largest decimals value a token may declare
pub const MAX_DECIMALS: u8 = 18;

/// A `uint256` token quantity, serialized as a decimal string so that
/// large supplies survive JSON round trips without precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Supply(U256);

impl Supply {
    /// Zero supply
    pub const ZERO: Supply = Supply(U256::ZERO);

    /// Wraps a raw `U256`
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Returns the raw value
    pub fn value(&self) -> U256 {
        self.0
    }
}

impl From<U256> for Supply {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for Supply {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Supply {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidSupply(s.to_string()));
        }
        U256::from_str_radix(digits, 10)
            .map(Self)
            .map_err(|_| ValidationError::InvalidSupply(s.to_string()))
    }
}

impl fmt::Display for Supply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Supply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Supply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SupplyVisitor;

        impl de::Visitor<'_> for SupplyVisitor {
            type Value = Supply;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal integer string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Supply, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Supply, E> {
                Ok(Supply::from(v))
            }
        }

        deserializer.deserialize_any(SupplyVisitor)
    }
}

/// A token the user created or discovered, scoped to an owner address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Token contract address
    pub address: ChainAddress,
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Supply minted at creation
    pub initial_supply: Supply,
    /// Hard cap on supply
    pub max_supply: Supply,
    /// Decimal places, 0..=18
    pub decimals: u8,
    /// Account that created the token
    pub creator: ChainAddress,
    /// Creation time, Unix milliseconds
    pub created_at: u64,
    /// Creation transaction hash, empty when discovered by sync
    #[serde(default)]
    pub transaction_hash: String,
    /// Network display name
    pub network: String,
    /// Chain the token lives on
    pub chain_id: u64,
}

impl TokenRecord {
    /// Checks constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.decimals > MAX_DECIMALS {
            return Err(ValidationError::DecimalsOutOfRange(self.decimals as u64));
        }
        Ok(())
    }

    /// Applies a re-added record on top of this one.
    ///
    /// The address is identity and never changes. An empty incoming
    /// transaction hash keeps the stored one. Every other field takes the
    /// incoming value.
    pub fn merge_from(&mut self, incoming: TokenRecord) {
        let TokenRecord {
            address: _,
            name,
            symbol,
            initial_supply,
            max_supply,
            decimals,
            creator,
            created_at,
            transaction_hash,
            network,
            chain_id,
        } = incoming;

        self.name = name;
        self.symbol = symbol;
        self.initial_supply = initial_supply;
        self.max_supply = max_supply;
        self.decimals = decimals;
        self.creator = creator;
        self.created_at = created_at;
        if !transaction_hash.is_empty() {
            self.transaction_hash = transaction_hash;
        }
        self.network = network;
        self.chain_id = chain_id;
    }

    /// Case-insensitive substring match on name, symbol or address.
    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.symbol.to_lowercase().contains(needle)
            || self.address.to_hex().contains(needle)
    }
}

/// Descriptive data attached to a token address, shared by every owner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Project website
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    /// Verification flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    /// Last write, Unix milliseconds
    #[serde(default)]
    pub last_updated: u64,
}

impl TokenMetadata {
    /// Applies a patch field by field: present fields overwrite, absent
    /// fields are left alone. `last_updated` never moves backwards.
    pub fn apply(&mut self, patch: MetadataPatch, now_ms: u64) {
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(website) = patch.website {
            self.website = Some(website);
        }
        if let Some(logo) = patch.logo {
            self.logo = Some(logo);
        }
        if let Some(tags) = patch.tags {
            self.tags = Some(tags);
        }
        if let Some(is_verified) = patch.is_verified {
            self.is_verified = Some(is_verified);
        }
        self.last_updated = self.last_updated.max(now_ms);
    }
}

/// A partial metadata update. Only the fields set here are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataPatch {
    /// New description
    pub description: Option<String>,
    /// New website
    pub website: Option<String>,
    /// New logo URL
    pub logo: Option<String>,
    /// Replacement tag set
    pub tags: Option<BTreeSet<String>>,
    /// New verification flag
    pub is_verified: Option<bool>,
}

impl MetadataPatch {
    /// Creates an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the website
    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Sets the logo URL
    pub fn logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    /// Replaces the tag set
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the verification flag
    pub fn verified(mut self, is_verified: bool) -> Self {
        self.is_verified = Some(is_verified);
        self
    }

    /// True when the patch sets nothing
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A record as returned to callers, with its metadata merged in at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserToken {
    /// The owner-scoped record
    #[serde(flatten)]
    pub record: TokenRecord,
    /// Metadata for the token address, if any was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TokenMetadata>,
}

/// Registry size report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Number of owners with at least one stored list
    pub user_count: usize,
    /// Records across all owners
    pub token_count: usize,
    /// Approximate serialized size of the token and metadata documents
    pub storage_bytes: usize,
    /// Last successful write, Unix milliseconds
    pub last_sync: Option<u64>,
}
