//! Token factory gateway

use crate::rpc::{call_contract, find_event, send_contract, tx_hash};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::sol;
use async_trait::async_trait;
use tracing::info;
use walletd_error::{ContractError, ValidationError};
use walletd_session::NetworkConfig;
use walletd_token_registry::{now_millis, ChainAddress, Supply, TokenRecord, MAX_DECIMALS};

sol! {
    /// Factory that deploys managed ERC-20 tokens and indexes them by creator
    contract TokenFactory {
        struct TokenInfo {
            address tokenAddress;
            string name;
            string symbol;
            uint256 initialSupply;
            uint256 maxSupply;
            uint8 decimals;
            address creator;
            uint256 createdAt;
        }

        event TokenCreated(
            address indexed tokenAddress,
            address indexed creator,
            string name,
            string symbol,
            uint256 initialSupply,
            uint256 maxSupply,
            uint8 decimals
        );

        function createToken(
            string name,
            string symbol,
            uint256 initialSupply,
            uint256 maxSupply,
            uint8 decimals
        ) external payable returns (address);

        function getTokensByCreator(address creator) external view returns (TokenInfo[] memory);

        function creationFee() external view returns (uint256);
    }
}

/// A token as the factory reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryToken {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub initial_supply: U256,
    pub max_supply: U256,
    pub decimals: u8,
    pub creator: Address,
    /// Block timestamp of the deployment, Unix seconds
    pub created_at_secs: u64,
}

impl FactoryToken {
    /// Builds a registry record on `network`. The factory does not know the
    /// deployment transaction, so pass an empty hash when it is unknown.
    pub fn into_record(self, network: &NetworkConfig, transaction_hash: String) -> TokenRecord {
        TokenRecord {
            address: ChainAddress::from(self.address),
            name: self.name,
            symbol: self.symbol,
            initial_supply: Supply::new(self.initial_supply),
            max_supply: Supply::new(self.max_supply),
            decimals: self.decimals,
            creator: ChainAddress::from(self.creator),
            created_at: self.created_at_secs.saturating_mul(1000),
            transaction_hash,
            network: network.name.clone(),
            chain_id: network.chain_id,
        }
    }
}

impl From<TokenFactory::TokenInfo> for FactoryToken {
    fn from(info: TokenFactory::TokenInfo) -> Self {
        Self {
            address: info.tokenAddress,
            name: info.name,
            symbol: info.symbol,
            initial_supply: info.initialSupply,
            max_supply: info.maxSupply,
            decimals: info.decimals,
            creator: info.creator,
            created_at_secs: u64::try_from(info.createdAt).unwrap_or(u64::MAX),
        }
    }
}

/// Parameters for deploying a new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub initial_supply: Supply,
    pub max_supply: Supply,
    pub decimals: u8,
}

impl CreateTokenRequest {
    /// Rejects requests no record could hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.decimals > MAX_DECIMALS {
            return Err(ValidationError::DecimalsOutOfRange(self.decimals as u64));
        }
        Ok(())
    }
}

/// The factory operations the token studio relies on.
#[async_trait]
pub trait TokenFactoryApi: Send + Sync {
    /// Every token deployed by `creator`
    async fn tokens_by_creator(&self, creator: Address) -> Result<Vec<FactoryToken>, ContractError>;

    /// Fee in wei that `create_token` must carry
    async fn creation_fee(&self) -> Result<U256, ContractError>;

    /// Deploys a token, paying the current creation fee, and returns its
    /// record including the transaction hash.
    async fn create_token(
        &self,
        signer: &EthereumWallet,
        creator: Address,
        request: &CreateTokenRequest,
    ) -> Result<TokenRecord, ContractError>;
}

/// [`TokenFactoryApi`] over JSON-RPC.
#[derive(Debug, Clone)]
pub struct FactoryGateway {
    address: Address,
    network: NetworkConfig,
}

impl FactoryGateway {
    /// Gateway for the factory at `address` on `network`
    pub fn new(address: Address, network: NetworkConfig) -> Self {
        Self { address, network }
    }

    /// Factory contract address
    pub fn contract_address(&self) -> Address {
        self.address
    }

    /// Network the factory lives on
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn rpc_url(&self) -> Result<&str, ContractError> {
        self.network
            .rpc_url()
            .ok_or_else(|| ContractError::NotConfigured(format!("no RPC URL for {}", self.network.name)))
    }
}

#[async_trait]
impl TokenFactoryApi for FactoryGateway {
    async fn tokens_by_creator(&self, creator: Address) -> Result<Vec<FactoryToken>, ContractError> {
        let tokens = call_contract(
            self.rpc_url()?,
            self.address,
            TokenFactory::getTokensByCreatorCall { creator },
        )
        .await?;
        Ok(tokens.into_iter().map(FactoryToken::from).collect())
    }

    async fn creation_fee(&self) -> Result<U256, ContractError> {
        call_contract(self.rpc_url()?, self.address, TokenFactory::creationFeeCall {}).await
    }

    async fn create_token(
        &self,
        signer: &EthereumWallet,
        creator: Address,
        request: &CreateTokenRequest,
    ) -> Result<TokenRecord, ContractError> {
        request
            .validate()
            .map_err(|e| ContractError::Other(e.to_string()))?;
        let fee = self.creation_fee().await?;

        let call = TokenFactory::createTokenCall {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            initialSupply: request.initial_supply.value(),
            maxSupply: request.max_supply.value(),
            decimals: request.decimals,
        };
        let receipt = send_contract(self.rpc_url()?, signer, self.address, call, fee).await?;
        let hash = tx_hash(&receipt);

        let event = find_event::<TokenFactory::TokenCreated>(&receipt, self.address)
            .ok_or_else(|| ContractError::MissingEvent(format!("TokenCreated in {hash}")))?;
        info!(token = %event.tokenAddress, tx_hash = %hash, "Token created");

        let mut record = FactoryToken {
            address: event.tokenAddress,
            name: event.name,
            symbol: event.symbol,
            initial_supply: event.initialSupply,
            max_supply: event.maxSupply,
            decimals: event.decimals,
            creator: if event.creator.is_zero() { creator } else { event.creator },
            created_at_secs: 0,
        }
        .into_record(&self.network, hash);
        record.created_at = now_millis();
        Ok(record)
    }
}
