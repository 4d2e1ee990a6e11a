//! Target network description

use serde::{Deserialize, Serialize};
use walletd_error::ValidationError;

/// Default chain id, Edgen Chain
pub const EDGEN_CHAIN_ID: u64 = 4207;

/// Default network display name
pub const EDGEN_NETWORK_NAME: &str = "Edgen Chain";

/// Default native currency symbol
pub const EDGEN_CURRENCY_SYMBOL: &str = "EDGEN";

/// Default local RPC endpoint
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The single EVM chain a session targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Numeric chain id
    pub chain_id: u64,
    /// Display name, also stored on token records
    pub name: String,
    /// Native currency name
    pub currency_name: String,
    /// Native currency ticker
    pub currency_symbol: String,
    /// Native currency decimals
    pub currency_decimals: u8,
    /// JSON-RPC endpoints, first is preferred
    pub rpc_urls: Vec<String>,
    /// Block explorer base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_url: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: EDGEN_CHAIN_ID,
            name: EDGEN_NETWORK_NAME.to_string(),
            currency_name: EDGEN_CURRENCY_SYMBOL.to_string(),
            currency_symbol: EDGEN_CURRENCY_SYMBOL.to_string(),
            currency_decimals: 18,
            rpc_urls: vec![DEFAULT_RPC_URL.to_string()],
            block_explorer_url: None,
        }
    }
}

impl NetworkConfig {
    /// Preferred RPC endpoint
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    /// Chain id as `0x`-prefixed hex, the form wallets expect
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Explorer link for a transaction, when an explorer is configured.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_link("tx", tx_hash)
    }

    /// Explorer link for an address, when an explorer is configured.
    pub fn explorer_address_url(&self, address: &str) -> Option<String> {
        self.explorer_link("address", address)
    }

    fn explorer_link(&self, kind: &str, id: &str) -> Option<String> {
        let base = self.block_explorer_url.as_deref()?.trim_end_matches('/');
        Some(format!("{base}/{kind}/{id}"))
    }

    /// Parameters for a wallet add-chain request.
    pub fn chain_params(&self) -> ChainParams {
        ChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.name.clone(),
            native_currency: NativeCurrency {
                name: self.currency_name.clone(),
                symbol: self.currency_symbol.clone(),
                decimals: self.currency_decimals,
            },
            rpc_urls: self.rpc_urls.clone(),
            block_explorer_urls: self.block_explorer_url.iter().cloned().collect(),
        }
    }
}

impl TryFrom<&ChainParams> for NetworkConfig {
    type Error = ValidationError;

    fn try_from(params: &ChainParams) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ValidationError::InvalidField {
            field: "chainId".to_string(),
            reason: reason.to_string(),
        };
        let digits = params
            .chain_id
            .strip_prefix("0x")
            .ok_or_else(|| invalid("expected 0x-prefixed hex"))?;
        let chain_id = u64::from_str_radix(digits, 16).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            chain_id,
            name: params.chain_name.clone(),
            currency_name: params.native_currency.name.clone(),
            currency_symbol: params.native_currency.symbol.clone(),
            currency_decimals: params.native_currency.decimals,
            rpc_urls: params.rpc_urls.clone(),
            block_explorer_url: params.block_explorer_urls.first().cloned(),
        })
    }
}

/// Body of a `wallet_addEthereumChain` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    /// `0x`-prefixed hex chain id
    pub chain_id: String,
    /// Display name
    pub chain_name: String,
    /// Native currency
    pub native_currency: NativeCurrency,
    /// JSON-RPC endpoints
    pub rpc_urls: Vec<String>,
    /// Explorer base URLs, possibly empty
    pub block_explorer_urls: Vec<String>,
}

/// Native currency block of [`ChainParams`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_explorer() -> NetworkConfig {
        NetworkConfig {
            block_explorer_url: Some("https://explorer.example/".to_string()),
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn test_default_is_edgen() {
        let config = NetworkConfig::default();
        assert_eq!(config.chain_id, 4207);
        assert_eq!(config.name, "Edgen Chain");
        assert_eq!(config.rpc_url(), Some("http://localhost:8545"));
        assert_eq!(config.chain_id_hex(), "0x106f");
    }

    #[test]
    fn test_chain_params_shape() {
        let json = serde_json::to_value(with_explorer().chain_params()).unwrap();
        assert_eq!(json["chainId"], "0x106f");
        assert_eq!(json["chainName"], "Edgen Chain");
        assert_eq!(json["nativeCurrency"]["symbol"], "EDGEN");
        assert_eq!(json["nativeCurrency"]["decimals"], 18);
        assert_eq!(json["rpcUrls"][0], "http://localhost:8545");
        assert_eq!(json["blockExplorerUrls"][0], "https://explorer.example/");
    }

    #[test]
    fn test_chain_params_convert_back() {
        let config = with_explorer();
        let back = NetworkConfig::try_from(&config.chain_params()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_chain_params_rejects_decimal_id() {
        let mut params = NetworkConfig::default().chain_params();
        params.chain_id = "4207".to_string();
        assert!(NetworkConfig::try_from(&params).is_err());
    }

    #[test]
    fn test_explorer_links() {
        let config = with_explorer();
        assert_eq!(
            config.explorer_tx_url("0xabc").as_deref(),
            Some("https://explorer.example/tx/0xabc")
        );
        assert_eq!(
            config.explorer_address_url("0xdef").as_deref(),
            Some("https://explorer.example/address/0xdef")
        );
        assert!(NetworkConfig::default().explorer_tx_url("0xabc").is_none());
    }
}
