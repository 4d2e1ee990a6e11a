//! Per-owner token registry

use crate::address::ChainAddress;
use crate::export::{ExportDocument, EXPORT_VERSION};
use crate::record::{MetadataPatch, StorageStats, TokenMetadata, TokenRecord, UserToken};
use crate::store::{KeyValueStore, MemoryStore, LAST_SYNC_KEY, TOKEN_METADATA_KEY, USER_TOKENS_KEY};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use walletd_error::StorageError;

type TokenMap = BTreeMap<ChainAddress, Vec<TokenRecord>>;
type MetadataMap = BTreeMap<ChainAddress, TokenMetadata>;

/// Durable cache of the tokens each owner has created or discovered.
///
/// Construct one per process at start-up and pass it to whatever needs it.
/// The registry never talks to the network. Every mutating call rewrites
/// the whole token and metadata documents to the store; store failures are
/// logged and otherwise swallowed, leaving the in-memory state authoritative.
pub struct TokenRegistry {
    store: Box<dyn KeyValueStore>,
    tokens: TokenMap,
    metadata: MetadataMap,
    last_sync: Option<u64>,
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("owners", &self.tokens.len())
            .field("metadata", &self.metadata.len())
            .field("last_sync", &self.last_sync)
            .finish()
    }
}

impl TokenRegistry {
    /// Opens a registry over `store`, loading whatever it holds. Unreadable
    /// or corrupt documents are logged and treated as empty.
    pub fn open(store: impl KeyValueStore + 'static) -> Self {
        let mut registry = Self {
            store: Box::new(store),
            tokens: TokenMap::new(),
            metadata: MetadataMap::new(),
            last_sync: None,
        };
        registry.load();
        registry
    }

    /// A registry over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::open(MemoryStore::new())
    }

    // ============================================================================
    // Owner-scoped records
    // ============================================================================

    /// Inserts `token` under `owner`, or merges it into the existing record
    /// with the same address.
    pub fn add_token(&mut self, owner: &ChainAddress, token: TokenRecord) {
        let inserted = self.upsert(owner, token);
        debug!(owner = %owner, inserted, "Stored token record");
        self.persist();
    }

    /// All of `owner`'s records in insertion order, with metadata merged in.
    pub fn get_user_tokens(&self, owner: &ChainAddress) -> Vec<UserToken> {
        self.tokens
            .get(owner)
            .map(|list| list.iter().map(|r| self.with_metadata(r)).collect())
            .unwrap_or_default()
    }

    /// A single record, if `owner` has one at `address`.
    pub fn get_token(&self, owner: &ChainAddress, address: &ChainAddress) -> Option<UserToken> {
        self.tokens
            .get(owner)?
            .iter()
            .find(|r| &r.address == address)
            .map(|r| self.with_metadata(r))
    }

    /// Removes `owner`'s record at `address`. Absent records are a no-op.
    pub fn remove_user_token(&mut self, owner: &ChainAddress, address: &ChainAddress) {
        let Some(list) = self.tokens.get_mut(owner) else {
            return;
        };
        let before = list.len();
        list.retain(|r| &r.address != address);
        if list.len() == before {
            return;
        }
        debug!(owner = %owner, token = %address, "Removed token record");
        self.persist();
    }

    /// Records whose name, symbol or address contains `query`, ignoring
    /// case. A blank query returns every record for the owner.
    pub fn search_tokens(&self, owner: &ChainAddress, query: &str) -> Vec<UserToken> {
        let needle = query.trim().to_lowercase();
        self.tokens
            .get(owner)
            .map(|list| {
                list.iter()
                    .filter(|r| needle.is_empty() || r.matches(&needle))
                    .map(|r| self.with_metadata(r))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `owner`'s records on `chain_id`.
    pub fn get_tokens_by_network(&self, owner: &ChainAddress, chain_id: u64) -> Vec<UserToken> {
        self.get_user_tokens(owner)
            .into_iter()
            .filter(|t| t.record.chain_id == chain_id)
            .collect()
    }

    /// True when `owner` has no records on `chain_id`.
    pub fn is_empty_for(&self, owner: &ChainAddress, chain_id: u64) -> bool {
        self.tokens
            .get(owner)
            .map_or(true, |list| list.iter().all(|r| r.chain_id != chain_id))
    }

    /// Every record of every owner.
    pub fn get_all_tokens(&self) -> Vec<TokenRecord> {
        self.tokens.values().flatten().cloned().collect()
    }

    /// Number of owners with a stored list
    pub fn user_count(&self) -> usize {
        self.tokens.len()
    }

    // ============================================================================
    // Metadata
    // ============================================================================

    /// Merges `patch` into the metadata for `address`, creating it if needed,
    /// and stamps `last_updated`.
    pub fn update_token_metadata(&mut self, address: &ChainAddress, patch: MetadataPatch) {
        let entry = self.metadata.entry(*address).or_default();
        entry.apply(patch, now_millis());
        debug!(token = %address, last_updated = entry.last_updated, "Updated token metadata");
        self.persist();
    }

    /// Metadata for `address`, if any was recorded
    pub fn get_token_metadata(&self, address: &ChainAddress) -> Option<&TokenMetadata> {
        self.metadata.get(address)
    }

    /// Drops the metadata for `address`. Absent entries are a no-op.
    pub fn remove_token_metadata(&mut self, address: &ChainAddress) {
        if self.metadata.remove(address).is_some() {
            self.persist();
        }
    }

    // ============================================================================
    // Export / import
    // ============================================================================

    /// Serializes `owner`'s records to a versioned JSON document.
    pub fn export_user_data(&self, owner: &ChainAddress) -> String {
        let document = ExportDocument {
            user_address: *owner,
            tokens: self.tokens.get(owner).cloned().unwrap_or_default(),
            exported_at: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        };
        match serde_json::to_string_pretty(&document) {
            Ok(json) => json,
            Err(e) => {
                error!(owner = %owner, error = %e, "Failed to serialize export");
                String::new()
            }
        }
    }

    /// Imports records from an export document into `owner`'s list.
    ///
    /// Each record is validated on its own; invalid ones are skipped. Returns
    /// `false` only when the payload is not a document with a `tokens` array.
    pub fn import_user_data(&mut self, owner: &ChainAddress, payload: &str) -> bool {
        let raw_tokens = match ExportDocument::token_values(payload) {
            Ok(values) => values,
            Err(e) => {
                warn!(owner = %owner, error = %e, "Rejected import payload");
                return false;
            }
        };

        let total = raw_tokens.len();
        let mut accepted = 0usize;
        for (index, raw) in raw_tokens.into_iter().enumerate() {
            match ExportDocument::record_from_value(raw) {
                Ok(record) => {
                    self.upsert(owner, record);
                    accepted += 1;
                }
                Err(e) => warn!(index, error = %e, "Skipping invalid token in import"),
            }
        }

        if accepted > 0 {
            self.persist();
        }
        info!(owner = %owner, accepted, skipped = total - accepted, "Imported user tokens");
        true
    }

    // ============================================================================
    // Administration
    // ============================================================================

    /// Wipes every owner, all metadata and the store.
    pub fn clear_all_data(&mut self) {
        self.tokens.clear();
        self.metadata.clear();
        self.last_sync = None;
        for key in [USER_TOKENS_KEY, TOKEN_METADATA_KEY, LAST_SYNC_KEY] {
            if let Err(e) = self.store.remove(key) {
                error!(error = %e, "Failed to clear store key");
            }
        }
        info!("Cleared all registry data");
    }

    /// Counts and approximate serialized size.
    pub fn get_storage_stats(&self) -> StorageStats {
        let storage_bytes = serde_json::to_string(&self.tokens).map(|s| s.len()).unwrap_or(0)
            + serde_json::to_string(&self.metadata).map(|s| s.len()).unwrap_or(0);
        StorageStats {
            user_count: self.tokens.len(),
            token_count: self.tokens.values().map(Vec::len).sum(),
            storage_bytes,
            last_sync: self.last_sync,
        }
    }

    // ============================================================================
    // Internals
    // ============================================================================

    /// Returns true when a new record was appended.
    fn upsert(&mut self, owner: &ChainAddress, token: TokenRecord) -> bool {
        let list = self.tokens.entry(*owner).or_default();
        match list.iter_mut().find(|r| r.address == token.address) {
            Some(existing) => {
                existing.merge_from(token);
                false
            }
            None => {
                list.push(token);
                true
            }
        }
    }

    fn with_metadata(&self, record: &TokenRecord) -> UserToken {
        UserToken {
            record: record.clone(),
            metadata: self.metadata.get(&record.address).cloned(),
        }
    }

    fn load(&mut self) {
        self.tokens = self.load_document(USER_TOKENS_KEY).unwrap_or_default();
        self.metadata = self.load_document(TOKEN_METADATA_KEY).unwrap_or_default();
        self.last_sync = self.load_document(LAST_SYNC_KEY);
        debug!(
            owners = self.tokens.len(),
            metadata = self.metadata.len(),
            "Loaded token registry"
        );
    }

    fn load_document<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Registry store unreadable, starting empty");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = StorageError::Serialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "Discarding corrupt registry document");
                None
            }
        }
    }

    fn persist(&mut self) {
        let now = now_millis();
        match self.write_all(now) {
            Ok(()) => self.last_sync = Some(now),
            Err(e) => error!(error = %e, "Failed to persist token registry"),
        }
    }

    fn write_all(&mut self, now: u64) -> Result<(), StorageError> {
        let store = &mut *self.store;
        write_document(store, USER_TOKENS_KEY, &self.tokens)?;
        write_document(store, TOKEN_METADATA_KEY, &self.metadata)?;
        write_document(store, LAST_SYNC_KEY, &now)
    }
}

fn write_document<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &json)
}

/// Current time in Unix milliseconds
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Supply;

    const OWNER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const TOKEN: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn addr(s: &str) -> ChainAddress {
        s.parse().unwrap()
    }

    fn record(address: &str, name: &str, symbol: &str) -> TokenRecord {
        TokenRecord {
            address: addr(address),
            name: name.to_string(),
            symbol: symbol.to_string(),
            initial_supply: Supply::from(1000u64),
            max_supply: Supply::from(10_000u64),
            decimals: 18,
            creator: addr(OWNER),
            created_at: 1_700_000_000_000,
            transaction_hash: "0x01".to_string(),
            network: "Edgen Chain".to_string(),
            chain_id: 4207,
        }
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read {
                key: key.to_string(),
                reason: "disk gone".to_string(),
            })
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
                reason: "disk gone".to_string(),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    // ============================================================================
    // Add / Get Tests
    // ============================================================================

    #[test]
    fn test_add_and_get_scenario() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        let token = record(TOKEN, "Test", "TST");

        registry.add_token(&owner, token.clone());
        let tokens = registry.get_user_tokens(&owner);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].record, token);
        assert!(tokens[0].metadata.is_none());

        let mut renamed = token.clone();
        renamed.name = "Renamed".to_string();
        registry.add_token(&owner, renamed);

        let tokens = registry.get_user_tokens(&owner);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].record.name, "Renamed");
        assert_eq!(tokens[0].record.symbol, "TST");
        assert_eq!(tokens[0].record.transaction_hash, "0x01");
    }

    #[test]
    fn test_owner_and_address_case_insensitive() {
        let mut registry = TokenRegistry::in_memory();
        registry.add_token(&addr(&OWNER.to_uppercase().replace("0X", "0x")), record(TOKEN, "Test", "TST"));
        registry.add_token(&addr(OWNER), record(&TOKEN.to_uppercase().replace("0X", "0x"), "Again", "TST"));

        let tokens = registry.get_user_tokens(&addr(OWNER));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].record.name, "Again");
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record("0x00000000000000000000000000000000000000ff", "Zeta", "ZZ"));
        registry.add_token(&owner, record("0x0000000000000000000000000000000000000001", "Alpha", "AA"));

        let names: Vec<_> = registry
            .get_user_tokens(&owner)
            .into_iter()
            .map(|t| t.record.name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_get_token() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Test", "TST"));

        assert!(registry.get_token(&owner, &addr(TOKEN)).is_some());
        assert!(registry.get_token(&owner, &ChainAddress::ZERO).is_none());
        assert!(registry.get_token(&ChainAddress::ZERO, &addr(TOKEN)).is_none());
    }

    // ============================================================================
    // Remove Tests
    // ============================================================================

    #[test]
    fn test_remove_user_token() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Test", "TST"));
        registry.remove_user_token(&owner, &addr(TOKEN));
        assert!(registry.get_user_tokens(&owner).is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Test", "TST"));
        let before = registry.get_storage_stats();

        registry.remove_user_token(&owner, &ChainAddress::ZERO);
        registry.remove_user_token(&ChainAddress::ZERO, &addr(TOKEN));

        assert_eq!(registry.get_user_tokens(&owner).len(), 1);
        assert_eq!(registry.get_storage_stats().last_sync, before.last_sync);
    }

    // ============================================================================
    // Search / Filter Tests
    // ============================================================================

    #[test]
    fn test_search_tokens() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record("0x0000000000000000000000000000000000000001", "Stable USD", "SUSD"));
        registry.add_token(&owner, record("0x0000000000000000000000000000000000000002", "Gold", "GLD"));
        registry.add_token(&owner, record("0x0000000000000000000000000000000000000003", "Other", "usdx"));

        let hits = registry.search_tokens(&owner, "USD");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|t| {
            t.record.name.to_lowercase().contains("usd") || t.record.symbol.to_lowercase().contains("usd")
        }));

        assert_eq!(registry.search_tokens(&owner, "0000000002").len(), 1);
        assert_eq!(registry.search_tokens(&owner, "  ").len(), 3);
    }

    #[test]
    fn test_search_unknown_owner_empty() {
        let registry = TokenRegistry::in_memory();
        assert!(registry.search_tokens(&addr(OWNER), "USD").is_empty());
    }

    #[test]
    fn test_tokens_by_network() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Test", "TST"));
        let mut other = record("0x0000000000000000000000000000000000000009", "Main", "MN");
        other.chain_id = 1;
        registry.add_token(&owner, other);

        assert_eq!(registry.get_tokens_by_network(&owner, 4207).len(), 1);
        assert_eq!(registry.get_tokens_by_network(&owner, 1).len(), 1);
        assert!(registry.get_tokens_by_network(&owner, 137).is_empty());
        assert!(!registry.is_empty_for(&owner, 4207));
        assert!(registry.is_empty_for(&owner, 137));
        assert!(registry.is_empty_for(&ChainAddress::ZERO, 4207));
    }

    #[test]
    fn test_get_all_tokens() {
        let mut registry = TokenRegistry::in_memory();
        registry.add_token(&addr(OWNER), record(TOKEN, "Test", "TST"));
        registry.add_token(&ChainAddress::ZERO, record(TOKEN, "Test", "TST"));
        assert_eq!(registry.get_all_tokens().len(), 2);
        assert_eq!(registry.user_count(), 2);
    }

    // ============================================================================
    // Metadata Tests
    // ============================================================================

    #[test]
    fn test_metadata_merged_at_read() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Test", "TST"));
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().tags(["defi"]));
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().description("hello"));

        let token = registry.get_token(&owner, &addr(TOKEN)).unwrap();
        let meta = token.metadata.unwrap();
        assert_eq!(meta.description.as_deref(), Some("hello"));
        assert!(meta.tags.unwrap().contains("defi"));
        assert!(meta.last_updated > 0);
    }

    #[test]
    fn test_metadata_is_global_per_address() {
        let mut registry = TokenRegistry::in_memory();
        registry.add_token(&addr(OWNER), record(TOKEN, "Test", "TST"));
        registry.add_token(&ChainAddress::ZERO, record(TOKEN, "Test", "TST"));
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().verified(true));

        for owner in [addr(OWNER), ChainAddress::ZERO] {
            let token = registry.get_token(&owner, &addr(TOKEN)).unwrap();
            assert_eq!(token.metadata.unwrap().is_verified, Some(true));
        }
    }

    #[test]
    fn test_metadata_without_record() {
        let mut registry = TokenRegistry::in_memory();
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().logo("ipfs://logo"));
        assert!(registry.get_token_metadata(&addr(TOKEN)).is_some());
        registry.remove_token_metadata(&addr(TOKEN));
        assert!(registry.get_token_metadata(&addr(TOKEN)).is_none());
    }

    #[test]
    fn test_last_updated_monotonic() {
        let mut registry = TokenRegistry::in_memory();
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().description("a"));
        let first = registry.get_token_metadata(&addr(TOKEN)).unwrap().last_updated;
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().description("b"));
        let second = registry.get_token_metadata(&addr(TOKEN)).unwrap().last_updated;
        assert!(second >= first);
    }

    // ============================================================================
    // Persistence Tests
    // ============================================================================

    #[test]
    fn test_reopen_sees_writes() {
        let store = MemoryStore::new();
        let owner = addr(OWNER);
        {
            let mut registry = TokenRegistry::open(store.clone());
            registry.add_token(&owner, record(TOKEN, "Test", "TST"));
            registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().website("https://t.st"));
        }

        let registry = TokenRegistry::open(store);
        let token = registry.get_token(&owner, &addr(TOKEN)).unwrap();
        assert_eq!(token.record.name, "Test");
        assert_eq!(token.metadata.unwrap().website.as_deref(), Some("https://t.st"));
        assert!(registry.get_storage_stats().last_sync.is_some());
    }

    #[test]
    fn test_metadata_not_persisted_with_records() {
        let store = MemoryStore::new();
        let mut registry = TokenRegistry::open(store.clone());
        registry.add_token(&addr(OWNER), record(TOKEN, "Test", "TST"));
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().description("kept apart"));

        let tokens_doc = store.get(USER_TOKENS_KEY).unwrap().unwrap();
        assert!(!tokens_doc.contains("kept apart"));
        let meta_doc = store.get(TOKEN_METADATA_KEY).unwrap().unwrap();
        assert!(meta_doc.contains("kept apart"));
    }

    #[test]
    fn test_corrupt_store_degrades_to_empty() {
        let mut store = MemoryStore::new();
        store.set(USER_TOKENS_KEY, "{ this is not json").unwrap();
        store.set(TOKEN_METADATA_KEY, "[]").unwrap();

        let registry = TokenRegistry::open(store);
        assert_eq!(registry.get_storage_stats().token_count, 0);
        assert!(registry.get_all_tokens().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let mut registry = TokenRegistry::open(BrokenStore);
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Test", "TST"));

        assert_eq!(registry.get_user_tokens(&owner).len(), 1);
        assert_eq!(registry.get_storage_stats().last_sync, None);
    }

    // ============================================================================
    // Export / Import Tests
    // ============================================================================

    #[test]
    fn test_export_import_round_trip() {
        let mut source = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        source.add_token(&owner, record(TOKEN, "Test", "TST"));
        source.add_token(&owner, record("0x0000000000000000000000000000000000000002", "Two", "TWO"));
        let exported = source.export_user_data(&owner);

        let doc: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(doc["version"], "1.0");
        assert_eq!(doc["userAddress"], OWNER);
        assert!(doc["exportedAt"].is_string());

        let mut target = TokenRegistry::in_memory();
        assert!(target.import_user_data(&owner, &exported));
        let imported: Vec<_> = target.get_user_tokens(&owner).into_iter().map(|t| t.record).collect();
        let original: Vec<_> = source.get_user_tokens(&owner).into_iter().map(|t| t.record).collect();
        assert_eq!(imported, original);
    }

    #[test]
    fn test_import_rekeys_to_importing_owner() {
        let mut source = TokenRegistry::in_memory();
        source.add_token(&addr(OWNER), record(TOKEN, "Test", "TST"));
        let exported = source.export_user_data(&addr(OWNER));

        let mut target = TokenRegistry::in_memory();
        assert!(target.import_user_data(&ChainAddress::ZERO, &exported));
        assert_eq!(target.get_user_tokens(&ChainAddress::ZERO).len(), 1);
        assert!(target.get_user_tokens(&addr(OWNER)).is_empty());
    }

    #[test]
    fn test_import_skips_invalid_records() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        let mut valid = serde_json::to_value(record(TOKEN, "Test", "TST")).unwrap();
        let mut invalid = valid.clone();
        invalid.as_object_mut().unwrap().remove("address");
        valid["name"] = serde_json::json!("Kept");
        let payload = serde_json::json!({ "tokens": [invalid, valid] }).to_string();

        assert!(registry.import_user_data(&owner, &payload));
        let tokens = registry.get_user_tokens(&owner);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].record.name, "Kept");
    }

    #[test]
    fn test_import_rejects_malformed_document() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        assert!(!registry.import_user_data(&owner, "garbage"));
        assert!(!registry.import_user_data(&owner, r#"{"tokens": "nope"}"#));
        assert!(!registry.import_user_data(&owner, r#"{"userAddress": "0x00"}"#));
        assert!(registry.get_user_tokens(&owner).is_empty());
    }

    #[test]
    fn test_import_merges_existing() {
        let mut registry = TokenRegistry::in_memory();
        let owner = addr(OWNER);
        registry.add_token(&owner, record(TOKEN, "Old", "TST"));
        let mut incoming = record(TOKEN, "New", "TST");
        incoming.transaction_hash = String::new();
        let payload = serde_json::json!({ "tokens": [incoming] }).to_string();

        assert!(registry.import_user_data(&owner, &payload));
        let tokens = registry.get_user_tokens(&owner);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].record.name, "New");
        assert_eq!(tokens[0].record.transaction_hash, "0x01");
    }

    #[test]
    fn test_export_unknown_owner_has_empty_tokens() {
        let registry = TokenRegistry::in_memory();
        let doc: serde_json::Value =
            serde_json::from_str(&registry.export_user_data(&addr(OWNER))).unwrap();
        assert_eq!(doc["tokens"].as_array().map(Vec::len), Some(0));
    }

    // ============================================================================
    // Administration Tests
    // ============================================================================

    #[test]
    fn test_clear_all_data() {
        let store = MemoryStore::new();
        let mut registry = TokenRegistry::open(store.clone());
        registry.add_token(&addr(OWNER), record(TOKEN, "Test", "TST"));
        registry.update_token_metadata(&addr(TOKEN), MetadataPatch::new().verified(true));

        registry.clear_all_data();
        assert!(registry.get_all_tokens().is_empty());
        assert!(registry.get_token_metadata(&addr(TOKEN)).is_none());
        assert!(store.is_empty());
        assert_eq!(registry.get_storage_stats().last_sync, None);
    }

    #[test]
    fn test_storage_stats() {
        let mut registry = TokenRegistry::in_memory();
        let empty = registry.get_storage_stats();
        assert_eq!((empty.user_count, empty.token_count), (0, 0));

        registry.add_token(&addr(OWNER), record(TOKEN, "Test", "TST"));
        registry.add_token(&addr(OWNER), record("0x0000000000000000000000000000000000000002", "Two", "TWO"));
        registry.add_token(&ChainAddress::ZERO, record(TOKEN, "Test", "TST"));

        let stats = registry.get_storage_stats();
        assert_eq!(stats.user_count, 2);
        assert_eq!(stats.token_count, 3);
        assert!(stats.storage_bytes > empty.storage_bytes);
        assert!(stats.last_sync.is_some());
    }
}
