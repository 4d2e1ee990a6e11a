//! Application context shared by every command

use crate::config::AppConfig;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use walletd_erc20::{AutoSync, FactoryGateway, TokenGateway};
use walletd_session::{ConnectedAccount, LocalWalletBridge, SessionUpdate, WalletSession};
use walletd_token_registry::{ChainAddress, FileStore, TokenRegistry};

/// Everything a command needs, built once per invocation.
pub struct AppContext {
    pub config: AppConfig,
    pub registry: TokenRegistry,
    pub session: WalletSession,
    auto_sync: AutoSync,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let registry = TokenRegistry::open(FileStore::new(&config.data_dir));
        let session = match &config.private_key {
            Some(key) => {
                let bridge = LocalWalletBridge::from_private_key(key, config.network.clone())
                    .context("WALLET_PRIVATE_KEY is not a usable key")?;
                WalletSession::new(Arc::new(bridge), config.network.clone())
            }
            None => WalletSession::without_wallet(config.network.clone()),
        };

        Ok(Self {
            config,
            registry,
            session,
            auto_sync: AutoSync::new(),
        })
    }

    /// Connects the wallet, applies queued notifications and runs the
    /// one-shot factory sync when it applies.
    pub async fn connect(&mut self) -> Result<ConnectedAccount> {
        let mut account = self.session.connect().await?;

        for update in self.session.process_pending().await {
            match update {
                SessionUpdate::ReloadRequired { chain_id } => {
                    info!(chain_id, "Reconnecting after chain change");
                    account = self.session.connect().await?;
                }
                SessionUpdate::AccountChanged(changed) => account = changed,
                SessionUpdate::Disconnected => return Err(anyhow!("Wallet disconnected")),
            }
        }

        if let Some(factory) = self.factory_if_configured() {
            match self
                .auto_sync
                .maybe_sync(&self.session, &factory, &mut self.registry)
                .await
            {
                Ok(Some(count)) => info!(count, "Auto-synced tokens from factory"),
                Ok(None) => {}
                Err(e) => warn!(error = %e.user_message(), "Auto-sync failed"),
            }
        }
        Ok(account)
    }

    /// Connected owner, connecting first when needed
    pub async fn owner(&mut self) -> Result<ChainAddress> {
        if let Some(address) = self.session.address() {
            return Ok(ChainAddress::from(address));
        }
        Ok(ChainAddress::from(self.connect().await?.address))
    }

    /// `explicit` when given, otherwise the connected owner
    pub async fn owner_or(&mut self, explicit: Option<&str>) -> Result<ChainAddress> {
        match explicit {
            Some(raw) => Ok(ChainAddress::parse(raw)?),
            None => self.owner().await,
        }
    }

    /// Connected owner together with its signer
    pub async fn signer(&mut self) -> Result<(Address, EthereumWallet)> {
        let owner = self.owner().await?;
        Ok((owner.as_address(), self.session.signer()?))
    }

    pub fn factory(&self) -> Result<FactoryGateway> {
        let address = self.config.factory_address()?;
        Ok(FactoryGateway::new(address, self.config.network.clone()))
    }

    fn factory_if_configured(&self) -> Option<FactoryGateway> {
        self.factory().ok()
    }

    pub fn token(&self, address: &ChainAddress) -> Result<TokenGateway> {
        let rpc_url = self
            .config
            .network
            .rpc_url()
            .ok_or_else(|| anyhow!("No RPC URL configured"))?;
        Ok(TokenGateway::new(address.as_address(), rpc_url))
    }
}
