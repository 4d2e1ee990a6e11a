//! # WalletD Testing Infrastructure
//!
//! Testing utilities for the WalletD token studio:
//! - Edge case addresses and supplies
//! - Token record fixtures
//! - A scriptable wallet bridge and an in-memory token factory
//! - Property-based testing strategies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use walletd_testing::*;
//!
//! let bridge = Arc::new(MockWalletBridge::on_chain(vec![Fixtures::owner().as_address()], 1).knowing(&[4207]));
//! let mut session = WalletSession::new(bridge.clone(), NetworkConfig::default());
//! session.connect().await?;
//! assert_eq!(bridge.calls(), vec!["request_accounts", "switch_chain"]);
//!
//! proptest! {
//!     #[test]
//!     fn test_address_case(addr in any_case_address()) {
//!         // ...
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use walletd_erc20::{CreateTokenRequest, FactoryToken, TokenFactoryApi};
use walletd_error::{ContractError, WalletError, UNRECOGNIZED_CHAIN_CODE, USER_REJECTED_CODE};
use walletd_session::{BridgeEvent, ChainParams, EventHub, EventSubscription, NetworkConfig, WalletBridge};
use walletd_token_registry::{ChainAddress, Supply, TokenRecord, MAX_DECIMALS};

// ============================================================================
// Edge Case Addresses
// ============================================================================

/// Edge case addresses for testing
pub struct EdgeCaseAddresses;

impl EdgeCaseAddresses {
    /// Valid mixed-case address
    pub const ETH_VALID: &'static str = "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9";

    /// Zero address
    pub const ETH_ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// Max address, upper case
    pub const ETH_MAX: &'static str = "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF";

    /// Inputs that must never parse
    pub fn invalid() -> Vec<&'static str> {
        vec![
            "",
            "0x",
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG", // Invalid hex
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5",      // Too short
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9ab", // Too long
            "742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",    // Missing 0x
            "not_an_address",
        ]
    }
}

// ============================================================================
// Edge Case Supplies
// ============================================================================

/// Supply strings at the edges of `uint256`
pub struct EdgeCaseSupplies;

impl EdgeCaseSupplies {
    /// `2^256 - 1`
    pub const U256_MAX: &'static str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";

    /// `2^256`, one past the largest supply
    pub const U256_OVERFLOW: &'static str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639936";

    /// Strings that parse as supplies
    pub fn valid() -> Vec<&'static str> {
        vec!["0", "1", "1000", "1000000000000000000000000", Self::U256_MAX]
    }

    /// Strings that do not
    pub fn invalid() -> Vec<&'static str> {
        vec!["", "-1", "1.5", "1e18", "0x10", " ", Self::U256_OVERFLOW]
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Canonical records used across the scenario tests
pub struct Fixtures;

impl Fixtures {
    /// Owner of the scenario token, `0xAAA…`
    pub const OWNER: &'static str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    /// Scenario token address, `0xBBB…`
    pub const TOKEN: &'static str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    /// Anvil's first dev key (DO NOT USE IN PRODUCTION)
    pub const DEV_KEY: &'static str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    /// Parsed [`Self::OWNER`]
    pub fn owner() -> ChainAddress {
        ChainAddress::parse(Self::OWNER).unwrap_or_default()
    }

    /// Parsed [`Self::TOKEN`]
    pub fn token_address() -> ChainAddress {
        ChainAddress::parse(Self::TOKEN).unwrap_or_default()
    }

    /// The scenario token: "Test"/"TST" on Edgen Chain
    pub fn scenario_token() -> TokenRecord {
        TokenRecord {
            address: Self::token_address(),
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            initial_supply: Supply::from(1000u64),
            max_supply: Supply::from(10_000u64),
            decimals: 18,
            creator: Self::owner(),
            created_at: 1_700_000_000_000,
            transaction_hash: "0x01".to_string(),
            network: "Edgen Chain".to_string(),
            chain_id: 4207,
        }
    }

    /// A record at `0x00…{last}` with the given name and symbol
    pub fn token(last: u8, name: &str, symbol: &str) -> TokenRecord {
        TokenRecord {
            address: ChainAddress::from(Address::with_last_byte(last)),
            name: name.to_string(),
            symbol: symbol.to_string(),
            ..Self::scenario_token()
        }
    }

    /// A factory listing entry created by `creator`
    pub fn factory_token(last: u8, creator: Address) -> FactoryToken {
        FactoryToken {
            address: Address::with_last_byte(last),
            name: format!("Factory Token {last}"),
            symbol: format!("FT{last}"),
            initial_supply: U256::from(1000u64),
            max_supply: U256::from(10_000u64),
            decimals: 18,
            creator,
            created_at_secs: 1_700_000_000,
        }
    }
}

// ============================================================================
// Mock Wallet Bridge
// ============================================================================

struct BridgeState {
    accounts: Vec<Address>,
    chain_id: u64,
    known_chains: Vec<u64>,
    reject_requests: bool,
    balance: U256,
    calls: Vec<&'static str>,
}

/// Scriptable [`WalletBridge`]. Records every state-changing request and
/// lets tests push notifications.
pub struct MockWalletBridge {
    state: Mutex<BridgeState>,
    hub: EventHub,
}

impl MockWalletBridge {
    /// Wallet exposing `accounts`, currently on `chain_id`, knowing only
    /// that chain
    pub fn on_chain(accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            state: Mutex::new(BridgeState {
                accounts,
                chain_id,
                known_chains: vec![chain_id],
                reject_requests: false,
                balance: U256::from(10u64).pow(U256::from(18u64)),
                calls: Vec::new(),
            }),
            hub: EventHub::new(),
        }
    }

    /// Also knows `chain_ids`, so switching to them succeeds
    pub fn knowing(self, chain_ids: &[u64]) -> Self {
        self.state().known_chains.extend_from_slice(chain_ids);
        self
    }

    /// Makes account requests fail with a user rejection
    pub fn rejecting(self) -> Self {
        self.state().reject_requests = true;
        self
    }

    /// Requests made so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    /// Replaces the exposed accounts and notifies subscribers
    pub fn change_accounts(&self, accounts: Vec<Address>) {
        self.state().accounts = accounts.clone();
        self.hub.emit(BridgeEvent::AccountsChanged(accounts));
    }

    /// Moves the wallet to `chain_id` and notifies subscribers
    pub fn change_chain(&self, chain_id: u64) {
        self.state().chain_id = chain_id;
        self.hub.emit(BridgeEvent::ChainChanged(chain_id));
    }

    fn state(&self) -> MutexGuard<'_, BridgeState> {
        // Test double; a poisoned lock means a test already panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl WalletBridge for MockWalletBridge {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let mut state = self.state();
        state.calls.push("request_accounts");
        if state.reject_requests {
            return Err(WalletError::from_code(USER_REJECTED_CODE, "User rejected the request.", None));
        }
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.state().accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.state().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let mut state = self.state();
        state.calls.push("switch_chain");
        if !state.known_chains.contains(&chain_id) {
            return Err(WalletError::from_code(
                UNRECOGNIZED_CHAIN_CODE,
                "Unrecognized chain ID",
                Some(chain_id),
            ));
        }
        state.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError> {
        let config = NetworkConfig::try_from(params).map_err(|e| WalletError::Provider {
            code: -32602,
            message: e.to_string(),
        })?;
        let mut state = self.state();
        state.calls.push("add_chain");
        state.known_chains.push(config.chain_id);
        Ok(())
    }

    async fn balance(&self, _address: Address) -> Result<U256, WalletError> {
        Ok(self.state().balance)
    }

    fn signer(&self, _address: Address) -> Result<EthereumWallet, WalletError> {
        Ok(EthereumWallet::from(PrivateKeySigner::random()))
    }

    fn subscribe(&self) -> EventSubscription {
        self.hub.subscribe()
    }

    fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }
}

// ============================================================================
// Mock Token Factory
// ============================================================================

/// In-memory [`TokenFactoryApi`] that counts enumeration calls.
pub struct MockFactory {
    tokens: Mutex<Vec<FactoryToken>>,
    fee: U256,
    listings: AtomicUsize,
}

impl MockFactory {
    /// Factory already holding `tokens`
    pub fn with_tokens(tokens: Vec<FactoryToken>) -> Self {
        Self {
            tokens: Mutex::new(tokens),
            fee: U256::from(1_000_000_000_000_000u64),
            listings: AtomicUsize::new(0),
        }
    }

    /// Number of `tokens_by_creator` calls served
    pub fn listing_calls(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    fn tokens(&self) -> MutexGuard<'_, Vec<FactoryToken>> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TokenFactoryApi for MockFactory {
    async fn tokens_by_creator(&self, creator: Address) -> Result<Vec<FactoryToken>, ContractError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tokens()
            .iter()
            .filter(|t| t.creator == creator)
            .cloned()
            .collect())
    }

    async fn creation_fee(&self) -> Result<U256, ContractError> {
        Ok(self.fee)
    }

    async fn create_token(
        &self,
        _signer: &EthereumWallet,
        creator: Address,
        request: &CreateTokenRequest,
    ) -> Result<TokenRecord, ContractError> {
        request
            .validate()
            .map_err(|e| ContractError::Other(e.to_string()))?;
        let mut tokens = self.tokens();
        let next = u8::try_from(tokens.len() + 1)
            .map_err(|_| ContractError::Other("mock factory is full".to_string()))?;

        let token = FactoryToken {
            address: Address::with_last_byte(next),
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            initial_supply: request.initial_supply.value(),
            max_supply: request.max_supply.value(),
            decimals: request.decimals,
            creator,
            created_at_secs: 1_700_000_000,
        };
        tokens.push(token.clone());
        Ok(token.into_record(&NetworkConfig::default(), format!("0x{next:064x}")))
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// 40 lowercase hex digits
pub fn address_digits() -> impl Strategy<Value = String> {
    "[0-9a-f]{40}"
}

/// An address string with each letter independently upper- or lowercased,
/// paired with its all-lowercase form
pub fn any_case_address() -> impl Strategy<Value = (String, String)> {
    (address_digits(), prop::collection::vec(any::<bool>(), 40)).prop_map(|(digits, upper)| {
        let mixed: String = digits
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        (format!("0x{mixed}"), format!("0x{digits}"))
    })
}

/// Decimal supply strings up to 2^128
pub fn supply_string() -> impl Strategy<Value = String> {
    any::<u128>().prop_map(|n| n.to_string())
}

/// Token names and symbols, including the empty string
pub fn display_string() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,24}"
}

/// Valid token records on Edgen Chain
pub fn token_record() -> impl Strategy<Value = TokenRecord> {
    (
        address_digits(),
        display_string(),
        display_string(),
        supply_string(),
        0u8..=MAX_DECIMALS,
        0u64..=4_102_444_800_000u64,
        "(0x[0-9a-f]{64})?",
    )
        .prop_map(|(digits, name, symbol, supply, decimals, created_at, tx)| TokenRecord {
            address: ChainAddress::parse(&format!("0x{digits}")).unwrap_or_default(),
            name,
            symbol,
            initial_supply: supply.parse().unwrap_or_default(),
            max_supply: supply.parse().unwrap_or_default(),
            decimals,
            creator: Fixtures::owner(),
            created_at,
            transaction_hash: tx,
            network: "Edgen Chain".to_string(),
            chain_id: 4207,
        })
}

// ============================================================================
// Tests
// ============================================================================
