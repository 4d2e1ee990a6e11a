//! # WalletD Session
//!
//! Wallet connection flow for the token studio: a [`WalletBridge`]
//! abstraction over EIP-1193 style wallets, the [`WalletSession`] state
//! machine that connects and keeps the wallet on the target network, and a
//! [`LocalWalletBridge`] for running against a local private key.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use walletd_session::prelude::*;
//!
//! let bridge = LocalWalletBridge::from_private_key(&key, NetworkConfig::default())?;
//! let mut session = WalletSession::new(Arc::new(bridge), NetworkConfig::default());
//! let account = session.connect().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod local;
pub mod network;
pub mod session;

pub use bridge::{BridgeEvent, EventHub, EventSubscription, WalletBridge};
pub use local::LocalWalletBridge;
pub use network::{ChainParams, NativeCurrency, NetworkConfig};
pub use session::{
    ConnectedAccount, NetworkStatus, SessionState, SessionUpdate, WalletAvailability, WalletSession,
};

/// Commonly used session types
pub mod prelude {
    pub use crate::bridge::{BridgeEvent, WalletBridge};
    pub use crate::local::LocalWalletBridge;
    pub use crate::network::NetworkConfig;
    pub use crate::session::{SessionUpdate, WalletSession};
}
