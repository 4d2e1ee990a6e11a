//! # WalletD Token Registry
//!
//! Local cache of the ERC-20 tokens each wallet owner has created or
//! discovered, backed by a pluggable key-value store.
//!
//! Records are scoped to an owner address. Descriptive metadata (website,
//! logo, tags) is keyed by token address alone and shared by every owner,
//! then merged into records when they are read.
//!
//! ```rust,ignore
//! use walletd_token_registry::prelude::*;
//!
//! let mut registry = TokenRegistry::open(FileStore::new("/tmp/studio"));
//! registry.add_token(&owner, record);
//! let hits = registry.search_tokens(&owner, "usd");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod export;
pub mod record;
pub mod registry;
pub mod store;

pub use address::ChainAddress;
pub use export::{ExportDocument, EXPORT_VERSION};
pub use record::{
    MetadataPatch, StorageStats, Supply, TokenMetadata, TokenRecord, UserToken, MAX_DECIMALS,
};
pub use registry::{now_millis, TokenRegistry};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Commonly used registry types
pub mod prelude {
    pub use crate::address::ChainAddress;
    pub use crate::record::{MetadataPatch, Supply, TokenRecord, UserToken};
    pub use crate::registry::TokenRegistry;
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore};
}
