//! End-to-end registry behaviour over real stores

use serde_json::json;
use walletd_testing::Fixtures;
use walletd_token_registry::{ChainAddress, FileStore, MemoryStore, MetadataPatch, TokenRegistry};

// ============================================================================
// Add / merge
// ============================================================================

#[test]
fn test_add_then_merge_keeps_single_record() {
    let mut registry = TokenRegistry::in_memory();
    let owner = Fixtures::owner();

    registry.add_token(&owner, Fixtures::scenario_token());
    let tokens = registry.get_user_tokens(&owner);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].record.name, "Test");
    assert!(tokens[0].metadata.is_none());

    let mut renamed = Fixtures::scenario_token();
    renamed.name = "Test2".to_string();
    renamed.transaction_hash = String::new();
    registry.add_token(&owner, renamed);

    let tokens = registry.get_user_tokens(&owner);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].record.name, "Test2");
    assert_eq!(tokens[0].record.transaction_hash, "0x01");
}

#[test]
fn test_owner_lookup_ignores_case() {
    let mut registry = TokenRegistry::in_memory();
    registry.add_token(&Fixtures::owner(), Fixtures::scenario_token());

    let lower = ChainAddress::parse(&Fixtures::OWNER.to_lowercase()).unwrap();
    assert_eq!(registry.get_user_tokens(&lower).len(), 1);
}

#[test]
fn test_search_and_network_filter() {
    let mut registry = TokenRegistry::in_memory();
    let owner = Fixtures::owner();
    registry.add_token(&owner, Fixtures::token(1, "USD Coin", "USDC"));
    registry.add_token(&owner, Fixtures::token(2, "Tether", "USDT"));
    let mut elsewhere = Fixtures::token(3, "Wrapped Ether", "WETH");
    elsewhere.chain_id = 1;
    registry.add_token(&owner, elsewhere);

    assert_eq!(registry.search_tokens(&owner, "USD").len(), 2);
    assert_eq!(registry.search_tokens(&owner, "usdc").len(), 1);
    assert_eq!(registry.search_tokens(&owner, "").len(), 3);
    assert_eq!(registry.get_tokens_by_network(&owner, 4207).len(), 2);
    assert_eq!(registry.get_tokens_by_network(&owner, 1).len(), 1);
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_metadata_merges_and_attaches() {
    let mut registry = TokenRegistry::in_memory();
    let owner = Fixtures::owner();
    let token = Fixtures::token_address();
    registry.add_token(&owner, Fixtures::scenario_token());

    registry.update_token_metadata(&token, MetadataPatch::new().description("A test token"));
    registry.update_token_metadata(&token, MetadataPatch::new().website("https://example.com"));

    let metadata = registry.get_token_metadata(&token).unwrap();
    assert_eq!(metadata.description.as_deref(), Some("A test token"));
    assert_eq!(metadata.website.as_deref(), Some("https://example.com"));

    let listed = registry.get_token(&owner, &token).unwrap();
    assert_eq!(listed.metadata.unwrap().description.as_deref(), Some("A test token"));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let owner = Fixtures::owner();
    {
        let mut registry = TokenRegistry::open(FileStore::new(dir.path()));
        registry.add_token(&owner, Fixtures::scenario_token());
        registry.update_token_metadata(&Fixtures::token_address(), MetadataPatch::new().verified(true));
    }

    let reopened = TokenRegistry::open(FileStore::new(dir.path()));
    let tokens = reopened.get_user_tokens(&owner);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].record, Fixtures::scenario_token());
    assert_eq!(tokens[0].metadata.as_ref().unwrap().is_verified, Some(true));
    assert!(reopened.get_storage_stats().last_sync.is_some());
}

#[test]
fn test_shared_memory_store_sees_writes() {
    let store = MemoryStore::new();
    let mut writer = TokenRegistry::open(store.clone());
    writer.add_token(&Fixtures::owner(), Fixtures::scenario_token());

    let reader = TokenRegistry::open(store);
    assert_eq!(reader.get_all_tokens().len(), 1);
}

#[test]
fn test_clear_wipes_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = TokenRegistry::open(FileStore::new(dir.path()));
    registry.add_token(&Fixtures::owner(), Fixtures::scenario_token());
    registry.clear_all_data();

    let reopened = TokenRegistry::open(FileStore::new(dir.path()));
    let stats = reopened.get_storage_stats();
    assert_eq!(stats.user_count, 0);
    assert_eq!(stats.token_count, 0);
    assert_eq!(stats.last_sync, None);
}

// ============================================================================
// Export / import
// ============================================================================

#[test]
fn test_export_import_between_registries() {
    let owner = Fixtures::owner();
    let mut source = TokenRegistry::in_memory();
    source.add_token(&owner, Fixtures::scenario_token());
    source.add_token(&owner, Fixtures::token(7, "Other", "OTH"));
    let exported = source.export_user_data(&owner);

    let document: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(document["version"], "1.0");
    assert_eq!(document["tokens"][0]["initialSupply"], "1000");

    let mut target = TokenRegistry::in_memory();
    assert!(target.import_user_data(&owner, &exported));
    assert_eq!(target.get_user_tokens(&owner), source.get_user_tokens(&owner));
}

#[test]
fn test_import_skips_invalid_entries() {
    let owner = Fixtures::owner();
    let good = serde_json::to_value(Fixtures::scenario_token()).unwrap();
    let mut bad_decimals = good.clone();
    bad_decimals["address"] = json!("0x00000000000000000000000000000000000000cc");
    bad_decimals["decimals"] = json!(30);
    let payload = json!({
        "userAddress": Fixtures::OWNER,
        "tokens": [good, bad_decimals, {"address": "nope"}],
        "exportedAt": "2024-01-01T00:00:00Z",
        "version": "1.0"
    });

    let mut registry = TokenRegistry::in_memory();
    assert!(registry.import_user_data(&owner, &payload.to_string()));
    assert_eq!(registry.get_user_tokens(&owner).len(), 1);
}

#[test]
fn test_import_rejects_non_document() {
    let mut registry = TokenRegistry::in_memory();
    let owner = Fixtures::owner();
    assert!(!registry.import_user_data(&owner, "not json"));
    assert!(!registry.import_user_data(&owner, "{\"tokens\": 5}"));
    assert!(registry.get_all_tokens().is_empty());
}
