//! Managed token gateway

use crate::rpc::{call_contract, send_contract, tx_hash};
use alloy::network::EthereumWallet;
use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use std::fmt;
use std::str::FromStr;
use tracing::info;
use walletd_error::{ContractError, ValidationError};

sol! {
    /// Capped, pausable ERC-20 with role-based access control
    contract ManagedToken {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function maxSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function paused() external view returns (bool);
        function hasRole(bytes32 role, address account) external view returns (bool);

        function DEFAULT_ADMIN_ROLE() external view returns (bytes32);
        function MINTER_ROLE() external view returns (bytes32);
        function PAUSER_ROLE() external view returns (bytes32);
        function BURNER_ROLE() external view returns (bytes32);

        function transfer(address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
        function burn(uint256 amount) external;
        function pause() external;
        function unpause() external;
        function grantRole(bytes32 role, address account) external;
        function revokeRole(bytes32 role, address account) external;
    }
}

/// Access-control roles of a managed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    DefaultAdmin,
    Minter,
    Pauser,
    Burner,
}

impl Role {
    /// Every role, admin first
    pub const ALL: [Role; 4] = [Role::DefaultAdmin, Role::Minter, Role::Pauser, Role::Burner];

    /// Constant name in the contract
    pub fn constant_name(&self) -> &'static str {
        match self {
            Role::DefaultAdmin => "DEFAULT_ADMIN_ROLE",
            Role::Minter => "MINTER_ROLE",
            Role::Pauser => "PAUSER_ROLE",
            Role::Burner => "BURNER_ROLE",
        }
    }

    /// Identifier under the usual AccessControl convention: zero for the
    /// admin, `keccak256(name)` otherwise. The contract remains the
    /// authority; see [`TokenGateway::role_id`].
    pub fn conventional_id(&self) -> B256 {
        match self {
            Role::DefaultAdmin => B256::ZERO,
            other => keccak256(other.constant_name()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::DefaultAdmin => "admin",
            Role::Minter => "minter",
            Role::Pauser => "pauser",
            Role::Burner => "burner",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "default_admin" | "default_admin_role" => Ok(Role::DefaultAdmin),
            "minter" | "minter_role" => Ok(Role::Minter),
            "pauser" | "pauser_role" => Ok(Role::Pauser),
            "burner" | "burner_role" => Ok(Role::Burner),
            _ => Err(ValidationError::InvalidField {
                field: "role".to_string(),
                reason: format!("unknown role '{s}', expected admin, minter, pauser or burner"),
            }),
        }
    }
}

/// Snapshot of a token's on-chain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSummary {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub max_supply: U256,
    pub paused: bool,
}

/// Calls into a single managed token contract.
#[derive(Debug, Clone)]
pub struct TokenGateway {
    address: Address,
    rpc_url: String,
}

impl TokenGateway {
    /// Gateway for the token at `address`, reached through `rpc_url`
    pub fn new(address: Address, rpc_url: impl Into<String>) -> Self {
        Self {
            address,
            rpc_url: rpc_url.into(),
        }
    }

    /// Token contract address
    pub fn contract_address(&self) -> Address {
        self.address
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, ContractError> {
        call_contract(&self.rpc_url, self.address, call).await
    }

    async fn write<C: SolCall>(&self, signer: &EthereumWallet, call: C) -> Result<String, ContractError> {
        let receipt = send_contract(&self.rpc_url, signer, self.address, call, U256::ZERO).await?;
        let hash = tx_hash(&receipt);
        info!(token = %self.address, function = C::SIGNATURE, tx_hash = %hash, "Token transaction confirmed");
        Ok(hash)
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub async fn name(&self) -> Result<String, ContractError> {
        self.read(ManagedToken::nameCall {}).await
    }

    pub async fn symbol(&self) -> Result<String, ContractError> {
        self.read(ManagedToken::symbolCall {}).await
    }

    pub async fn decimals(&self) -> Result<u8, ContractError> {
        self.read(ManagedToken::decimalsCall {}).await
    }

    pub async fn total_supply(&self) -> Result<U256, ContractError> {
        self.read(ManagedToken::totalSupplyCall {}).await
    }

    pub async fn max_supply(&self) -> Result<U256, ContractError> {
        self.read(ManagedToken::maxSupplyCall {}).await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, ContractError> {
        self.read(ManagedToken::balanceOfCall { account }).await
    }

    pub async fn paused(&self) -> Result<bool, ContractError> {
        self.read(ManagedToken::pausedCall {}).await
    }

    /// Role identifier as the contract defines it
    pub async fn role_id(&self, role: Role) -> Result<B256, ContractError> {
        match role {
            Role::DefaultAdmin => self.read(ManagedToken::DEFAULT_ADMIN_ROLECall {}).await,
            Role::Minter => self.read(ManagedToken::MINTER_ROLECall {}).await,
            Role::Pauser => self.read(ManagedToken::PAUSER_ROLECall {}).await,
            Role::Burner => self.read(ManagedToken::BURNER_ROLECall {}).await,
        }
    }

    pub async fn has_role(&self, role: Role, account: Address) -> Result<bool, ContractError> {
        let role = self.role_id(role).await?;
        self.read(ManagedToken::hasRoleCall { role, account }).await
    }

    /// Reads name, symbol, decimals, supplies and pause state.
    pub async fn summary(&self) -> Result<TokenSummary, ContractError> {
        Ok(TokenSummary {
            name: self.name().await?,
            symbol: self.symbol().await?,
            decimals: self.decimals().await?,
            total_supply: self.total_supply().await?,
            max_supply: self.max_supply().await?,
            paused: self.paused().await?,
        })
    }

    // ============================================================================
    // Writes, each returning the confirmed transaction hash
    // ============================================================================

    pub async fn transfer(&self, signer: &EthereumWallet, to: Address, amount: U256) -> Result<String, ContractError> {
        self.write(signer, ManagedToken::transferCall { to, amount }).await
    }

    pub async fn mint(&self, signer: &EthereumWallet, to: Address, amount: U256) -> Result<String, ContractError> {
        self.write(signer, ManagedToken::mintCall { to, amount }).await
    }

    pub async fn burn(&self, signer: &EthereumWallet, amount: U256) -> Result<String, ContractError> {
        self.write(signer, ManagedToken::burnCall { amount }).await
    }

    pub async fn pause(&self, signer: &EthereumWallet) -> Result<String, ContractError> {
        self.write(signer, ManagedToken::pauseCall {}).await
    }

    pub async fn unpause(&self, signer: &EthereumWallet) -> Result<String, ContractError> {
        self.write(signer, ManagedToken::unpauseCall {}).await
    }

    pub async fn grant_role(&self, signer: &EthereumWallet, role: Role, account: Address) -> Result<String, ContractError> {
        let role = self.role_id(role).await?;
        self.write(signer, ManagedToken::grantRoleCall { role, account }).await
    }

    pub async fn revoke_role(&self, signer: &EthereumWallet, role: Role, account: Address) -> Result<String, ContractError> {
        let role = self.role_id(role).await?;
        self.write(signer, ManagedToken::revokeRoleCall { role, account }).await
    }
}
