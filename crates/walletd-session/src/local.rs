//! Wallet bridge backed by a local private key

use crate::bridge::{BridgeEvent, EventHub, EventSubscription, WalletBridge};
use crate::network::{ChainParams, NetworkConfig};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use walletd_error::{WalletError, UNRECOGNIZED_CHAIN_CODE};

/// JSON-RPC "invalid params"
const INVALID_PARAMS_CODE: i64 = -32602;

/// EIP-1193 "unauthorized": the account is not held by this wallet
const UNAUTHORIZED_CODE: i64 = 4100;

/// JSON-RPC "internal error"
const INTERNAL_ERROR_CODE: i64 = -32603;

struct Networks {
    known: Vec<NetworkConfig>,
    active: u64,
}

/// A single-account wallet holding its key in process and talking to
/// chains over HTTP JSON-RPC.
///
/// Chain switching selects among the networks the wallet knows; adding a
/// chain registers another one. Switching emits
/// [`BridgeEvent::ChainChanged`] the same way a browser wallet does.
pub struct LocalWalletBridge {
    signer: PrivateKeySigner,
    networks: Mutex<Networks>,
    hub: EventHub,
}

impl std::fmt::Debug for LocalWalletBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletBridge")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl LocalWalletBridge {
    /// Builds a wallet from a hex private key, `0x` prefix optional. The
    /// wallet starts on `network`.
    pub fn from_private_key(private_key: &str, network: NetworkConfig) -> Result<Self, WalletError> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let bytes = hex::decode(key).map_err(|e| invalid_key(&e.to_string()))?;
        let signer = PrivateKeySigner::from_slice(&bytes).map_err(|e| invalid_key(&e.to_string()))?;
        Ok(Self::with_signer(signer, network))
    }

    /// Wraps an existing signer
    pub fn with_signer(signer: PrivateKeySigner, network: NetworkConfig) -> Self {
        Self {
            signer,
            networks: Mutex::new(Networks {
                active: network.chain_id,
                known: vec![network],
            }),
            hub: EventHub::new(),
        }
    }

    /// The single account this wallet holds
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Network the wallet is currently on
    pub fn active_network(&self) -> Result<NetworkConfig, WalletError> {
        let networks = self.networks()?;
        networks
            .known
            .iter()
            .find(|n| n.chain_id == networks.active)
            .cloned()
            .ok_or(WalletError::UnrecognizedChain {
                chain_id: networks.active,
            })
    }

    /// Chains the wallet can switch to
    pub fn known_chain_ids(&self) -> Result<Vec<u64>, WalletError> {
        Ok(self.networks()?.known.iter().map(|n| n.chain_id).collect())
    }

    fn networks(&self) -> Result<MutexGuard<'_, Networks>, WalletError> {
        self.networks.lock().map_err(|_| WalletError::Provider {
            code: INTERNAL_ERROR_CODE,
            message: "wallet state lock poisoned".to_string(),
        })
    }
}

fn invalid_key(reason: &str) -> WalletError {
    WalletError::Provider {
        code: INVALID_PARAMS_CODE,
        message: format!("Invalid private key: {reason}"),
    }
}

#[async_trait]
impl WalletBridge for LocalWalletBridge {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.signer.address()])
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.signer.address()])
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.networks()?.active)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let changed = {
            let mut networks = self.networks()?;
            if !networks.known.iter().any(|n| n.chain_id == chain_id) {
                return Err(WalletError::from_code(
                    UNRECOGNIZED_CHAIN_CODE,
                    format!("Unrecognized chain ID {chain_id:#x}"),
                    Some(chain_id),
                ));
            }
            let changed = networks.active != chain_id;
            networks.active = chain_id;
            changed
        };

        if changed {
            info!(chain_id, "Local wallet switched chain");
            self.hub.emit(BridgeEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError> {
        let config = NetworkConfig::try_from(params).map_err(|e| WalletError::Provider {
            code: INVALID_PARAMS_CODE,
            message: e.to_string(),
        })?;
        debug!(chain_id = config.chain_id, name = %config.name, "Registering chain");

        let mut networks = self.networks()?;
        networks.known.retain(|n| n.chain_id != config.chain_id);
        networks.known.push(config);
        Ok(())
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        let network = self.active_network()?;
        let rpc_url = network.rpc_url().ok_or_else(|| WalletError::Provider {
            code: INTERNAL_ERROR_CODE,
            message: format!("No RPC URL configured for {}", network.name),
        })?;
        let provider = ProviderBuilder::new().connect_http(rpc_url.parse().map_err(|e| {
            WalletError::Provider {
                code: INVALID_PARAMS_CODE,
                message: format!("Invalid URL: {e}"),
            }
        })?);
        provider
            .get_balance(address)
            .await
            .map_err(|e| WalletError::Provider {
                code: INTERNAL_ERROR_CODE,
                message: format!("Failed to get balance: {e}"),
            })
    }

    fn signer(&self, address: Address) -> Result<EthereumWallet, WalletError> {
        if address != self.signer.address() {
            return Err(WalletError::Provider {
                code: UNAUTHORIZED_CODE,
                message: format!("Account {address} is not held by this wallet"),
            });
        }
        Ok(EthereumWallet::from(self.signer.clone()))
    }

    fn subscribe(&self) -> EventSubscription {
        self.hub.subscribe()
    }

    fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }
}
