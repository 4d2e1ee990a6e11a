//! Wallet connection state machine

use crate::bridge::{BridgeEvent, EventSubscription, WalletBridge};
use crate::network::NetworkConfig;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walletd_error::WalletError;

/// Whether a wallet bridge exists at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAvailability {
    /// A bridge is present
    Installed,
    /// No wallet; every connect attempt fails
    NotInstalled,
}

/// How the wallet's chain relates to the target network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Wallet is on the target chain
    Correct,
    /// Wallet is on another chain
    Wrong,
    /// Chain could not be determined
    Unknown,
}

/// Details of a connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedAccount {
    /// Active account
    pub address: Address,
    /// Chain the wallet reported
    pub chain_id: u64,
    /// Native balance in wei
    pub balance: U256,
    /// Relation to the target network
    pub network_status: NetworkStatus,
}

/// Connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No account
    Disconnected,
    /// A connect is in flight
    Connecting,
    /// Account resolved
    Connected(ConnectedAccount),
}

/// What a processed bridge event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The wallet exposed no accounts; the session is disconnected
    Disconnected,
    /// The active account changed and was re-resolved
    AccountChanged(ConnectedAccount),
    /// The wallet changed chain. The session has reset and everything
    /// derived from it must be rebuilt.
    ReloadRequired {
        /// Chain the wallet moved to
        chain_id: u64,
    },
}

/// A user's connection to their wallet, targeting one network.
///
/// The session subscribes to bridge notifications when constructed and
/// releases the subscription when dropped.
pub struct WalletSession {
    bridge: Option<Arc<dyn WalletBridge>>,
    network: NetworkConfig,
    state: SessionState,
    last_error: Option<String>,
    events: Option<EventSubscription>,
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("availability", &self.availability())
            .field("network", &self.network.chain_id)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl WalletSession {
    /// Creates a disconnected session over `bridge`.
    pub fn new(bridge: Arc<dyn WalletBridge>, network: NetworkConfig) -> Self {
        let events = Some(bridge.subscribe());
        Self {
            bridge: Some(bridge),
            network,
            state: SessionState::Disconnected,
            last_error: None,
            events,
        }
    }

    /// A session for an environment with no wallet.
    pub fn without_wallet(network: NetworkConfig) -> Self {
        Self {
            bridge: None,
            network,
            state: SessionState::Disconnected,
            last_error: None,
            events: None,
        }
    }

    /// Whether a wallet bridge is present
    pub fn availability(&self) -> WalletAvailability {
        if self.bridge.is_some() {
            WalletAvailability::Installed
        } else {
            WalletAvailability::NotInstalled
        }
    }

    /// Target network
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Connected account, if any
    pub fn account(&self) -> Option<&ConnectedAccount> {
        match &self.state {
            SessionState::Connected(account) => Some(account),
            _ => None,
        }
    }

    /// Active address, if connected
    pub fn address(&self) -> Option<Address> {
        self.account().map(|a| a.address)
    }

    /// True when an account is resolved
    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// True when connected and on the target chain
    pub fn is_correct_network(&self) -> bool {
        self.account()
            .is_some_and(|a| a.network_status == NetworkStatus::Correct)
    }

    /// Message from the last failed connect, cleared on success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Connects to the wallet and moves it onto the target network.
    ///
    /// Requests accounts, then switches chain when needed. A wallet that
    /// does not know the target chain is asked to add it and switch again.
    /// On failure the session is left disconnected and the error message
    /// is recorded.
    pub async fn connect(&mut self) -> Result<ConnectedAccount, WalletError> {
        let Some(bridge) = self.bridge.clone() else {
            return Err(self.fail(WalletError::NotInstalled));
        };

        self.state = SessionState::Connecting;
        match self.establish(bridge.as_ref()).await {
            Ok(account) => {
                info!(
                    address = %account.address,
                    chain_id = account.chain_id,
                    "Wallet connected"
                );
                self.state = SessionState::Connected(account.clone());
                self.last_error = None;
                Ok(account)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Forgets the connection locally. The wallet is not contacted.
    pub fn disconnect(&mut self) {
        if self.is_connected() {
            info!("Wallet disconnected");
        }
        self.state = SessionState::Disconnected;
    }

    /// Re-reads the balance of the connected account.
    pub async fn refresh_balance(&mut self) -> Result<U256, WalletError> {
        let bridge = self.bridge.clone().ok_or(WalletError::NotInstalled)?;
        let SessionState::Connected(account) = &mut self.state else {
            return Err(WalletError::NotConnected);
        };
        account.balance = bridge.balance(account.address).await?;
        Ok(account.balance)
    }

    /// Signer for the connected account.
    pub fn signer(&self) -> Result<EthereumWallet, WalletError> {
        let bridge = self.bridge.as_ref().ok_or(WalletError::NotInstalled)?;
        let address = self.address().ok_or(WalletError::NotConnected)?;
        bridge.signer(address)
    }

    /// Applies every queued bridge notification, in arrival order.
    pub async fn process_pending(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Some(event) = self.events.as_mut().and_then(EventSubscription::try_next) {
            updates.push(self.handle_event(event).await);
        }
        updates
    }

    /// Waits for the next bridge notification and applies it. `None` when
    /// there is no wallet or the bridge has gone away.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let event = self.events.as_mut()?.next().await?;
        Some(self.handle_event(event).await)
    }

    /// Applies a single bridge notification.
    pub async fn handle_event(&mut self, event: BridgeEvent) -> SessionUpdate {
        match event {
            BridgeEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    self.disconnect();
                    SessionUpdate::Disconnected
                }
                Some(&address) => self.switch_account(address).await,
            },
            BridgeEvent::ChainChanged(chain_id) => {
                info!(chain_id, "Wallet changed chain, reload required");
                self.state = SessionState::Disconnected;
                SessionUpdate::ReloadRequired { chain_id }
            }
        }
    }

    async fn switch_account(&mut self, address: Address) -> SessionUpdate {
        let Some(bridge) = self.bridge.clone() else {
            self.state = SessionState::Disconnected;
            return SessionUpdate::Disconnected;
        };
        match self.resolve(bridge.as_ref(), address).await {
            Ok(account) => {
                debug!(address = %account.address, "Active account changed");
                self.state = SessionState::Connected(account.clone());
                SessionUpdate::AccountChanged(account)
            }
            Err(e) => {
                self.fail(e);
                SessionUpdate::Disconnected
            }
        }
    }

    async fn establish(&self, bridge: &dyn WalletBridge) -> Result<ConnectedAccount, WalletError> {
        let accounts = bridge.request_accounts().await?;
        let address = *accounts.first().ok_or(WalletError::NoAccounts)?;
        self.ensure_network(bridge).await?;
        self.resolve(bridge, address).await
    }

    async fn ensure_network(&self, bridge: &dyn WalletBridge) -> Result<(), WalletError> {
        let target = self.network.chain_id;
        if bridge.chain_id().await? == target {
            return Ok(());
        }

        debug!(target, "Switching wallet network");
        match bridge.switch_chain(target).await {
            Ok(()) => {}
            Err(WalletError::UnrecognizedChain { .. }) => {
                info!(target, name = %self.network.name, "Adding network to wallet");
                bridge.add_chain(&self.network.chain_params()).await?;
                bridge.switch_chain(target).await?;
            }
            Err(e) => return Err(e),
        }

        let got = bridge.chain_id().await?;
        if got == target {
            Ok(())
        } else {
            Err(WalletError::WrongNetwork {
                expected: target,
                expected_name: self.network.name.clone(),
                got,
            })
        }
    }

    async fn resolve(
        &self,
        bridge: &dyn WalletBridge,
        address: Address,
    ) -> Result<ConnectedAccount, WalletError> {
        let (chain_id, network_status) = match bridge.chain_id().await {
            Ok(id) if id == self.network.chain_id => (id, NetworkStatus::Correct),
            Ok(id) => (id, NetworkStatus::Wrong),
            Err(e) => {
                warn!(error = %e, "Could not read wallet chain id");
                (0, NetworkStatus::Unknown)
            }
        };
        let balance = bridge.balance(address).await?;
        Ok(ConnectedAccount {
            address,
            chain_id,
            balance,
            network_status,
        })
    }

    fn fail(&mut self, err: WalletError) -> WalletError {
        warn!(error = %err, "Wallet connection failed");
        self.state = SessionState::Disconnected;
        self.last_error = Some(err.to_string());
        err
    }
}
