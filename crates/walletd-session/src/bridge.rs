//! Wallet bridge contract and change notifications

use crate::network::ChainParams;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tokio::sync::broadcast;
use walletd_error::WalletError;

/// Buffered notifications per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 16;

/// Change notifications pushed by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The exposed account list changed; empty means the wallet locked or
    /// revoked access
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another chain
    ChainChanged(u64),
}

/// An external wallet in the EIP-1193 mould.
///
/// Errors use the EIP-1193 codes through [`WalletError::from_code`]:
/// 4001 is a user rejection, 4902 an unknown chain.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Asks the user to expose accounts (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Accounts already exposed, without prompting (`eth_accounts`)
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Chain the wallet is currently on (`eth_chainId`)
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError>;

    /// Native balance in wei
    async fn balance(&self, address: Address) -> Result<U256, WalletError>;

    /// Signer for transactions sent from `address`
    fn signer(&self, address: Address) -> Result<EthereumWallet, WalletError>;

    /// Opens a notification subscription. Dropping the handle unsubscribes.
    fn subscribe(&self) -> EventSubscription;

    /// Number of live subscriptions
    fn listener_count(&self) -> usize;
}

/// Fan-out point for [`BridgeEvent`]s, shared by bridge implementations.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<BridgeEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }
}

impl EventHub {
    /// Creates a hub with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every live subscription. Returns how many
    /// subscriptions received it.
    pub fn emit(&self, event: BridgeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Opens a new subscription
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live registration for bridge notifications; released on drop.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: broadcast::Receiver<BridgeEvent>,
}

impl EventSubscription {
    /// Takes the next queued event without waiting.
    ///
    /// Events lost to a full buffer are skipped; `None` means nothing is
    /// queued or the bridge is gone.
    pub fn try_next(&mut self) -> Option<BridgeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Wallet events dropped");
                }
                Err(_) => return None,
            }
        }
    }

    /// Waits for the next event. `None` once the bridge is gone.
    pub async fn next(&mut self) -> Option<BridgeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Wallet events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_counts() {
        let hub = EventHub::new();
        assert_eq!(hub.listener_count(), 0);

        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.listener_count(), 2);

        drop(first);
        assert_eq!(hub.listener_count(), 1);
        drop(second);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_emit_without_listeners() {
        let hub = EventHub::new();
        assert_eq!(hub.emit(BridgeEvent::ChainChanged(1)), 0);
    }

    #[test]
    fn test_events_delivered_in_order() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();
        hub.emit(BridgeEvent::AccountsChanged(vec![]));
        hub.emit(BridgeEvent::ChainChanged(4207));

        assert_eq!(sub.try_next(), Some(BridgeEvent::AccountsChanged(vec![])));
        assert_eq!(sub.try_next(), Some(BridgeEvent::ChainChanged(4207)));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_lagged_subscription_recovers() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();
        for id in 0..(EVENT_CAPACITY as u64 + 4) {
            hub.emit(BridgeEvent::ChainChanged(id));
        }
        assert_eq!(sub.try_next(), Some(BridgeEvent::ChainChanged(4)));
    }

    #[tokio::test]
    async fn test_next_ends_when_hub_dropped() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();
        hub.emit(BridgeEvent::ChainChanged(1));
        drop(hub);
        assert_eq!(sub.next().await, Some(BridgeEvent::ChainChanged(1)));
        assert_eq!(sub.next().await, None);
    }
}
