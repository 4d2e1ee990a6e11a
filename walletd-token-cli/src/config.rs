//! Configuration

use alloy::primitives::Address;
use std::path::PathBuf;
use thiserror::Error;
use walletd_session::network::{DEFAULT_RPC_URL, EDGEN_CHAIN_ID, EDGEN_CURRENCY_SYMBOL, EDGEN_NETWORK_NAME};
use walletd_session::NetworkConfig;

/// Directory name under the platform data dir
const DATA_DIR_NAME: &str = "walletd-token-studio";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("TOKEN_FACTORY_ADDRESS is not set")]
    MissingFactory,
}

/// Settings read once at start-up.
#[derive(Clone)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub factory_address: Option<Address>,
    pub private_key: Option<String>,
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("network", &self.network)
            .field("factory_address", &self.factory_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl AppConfig {
    /// Reads the process environment. Load `.env` before calling.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let chain_id = match var("CHAIN_ID") {
            Some(raw) => parse_chain_id(&raw).ok_or(ConfigError::Invalid {
                var: "CHAIN_ID",
                expected: "chain id",
                value: raw,
            })?,
            None => EDGEN_CHAIN_ID,
        };

        let factory_address = match var("TOKEN_FACTORY_ADDRESS") {
            Some(raw) => Some(raw.parse::<Address>().map_err(|_| ConfigError::Invalid {
                var: "TOKEN_FACTORY_ADDRESS",
                expected: "address",
                value: raw,
            })?),
            None => None,
        };

        let symbol = var("CURRENCY_SYMBOL").unwrap_or_else(|| EDGEN_CURRENCY_SYMBOL.to_string());
        let network = NetworkConfig {
            chain_id,
            name: var("NETWORK_NAME").unwrap_or_else(|| EDGEN_NETWORK_NAME.to_string()),
            currency_name: symbol.clone(),
            currency_symbol: symbol,
            rpc_urls: vec![var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string())],
            block_explorer_url: var("EXPLORER_URL"),
            ..NetworkConfig::default()
        };

        let data_dir = var("TOKEN_STUDIO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            network,
            factory_address,
            private_key: var("WALLET_PRIVATE_KEY"),
            data_dir,
        })
    }

    /// Factory address, required by contract commands
    pub fn factory_address(&self) -> Result<Address, ConfigError> {
        self.factory_address.ok_or(ConfigError::MissingFactory)
    }
}

/// Accepts decimal or `0x` hex.
fn parse_chain_id(raw: &str) -> Option<u64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}
