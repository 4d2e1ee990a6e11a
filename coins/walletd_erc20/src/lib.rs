//! WalletD ERC-20 module
//!
//! Contract gateways for the token studio. [`FactoryGateway`] deploys new
//! tokens through the factory contract and lists the tokens a creator has
//! deployed; [`TokenGateway`] reads and administers a single managed token.
//! [`sync_with_blockchain`] pulls factory-indexed tokens into the local
//! registry, and [`AutoSync`] decides when that happens on its own.
//!
//! Reads go straight to the configured RPC endpoint. Writes need an
//! [`EthereumWallet`](alloy::network::EthereumWallet) signer from the
//! wallet session and resolve to the confirmed transaction hash.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

pub mod factory;
mod rpc;
pub mod sync;
pub mod token;

pub use factory::{CreateTokenRequest, FactoryGateway, FactoryToken, TokenFactoryApi};
pub use sync::{sync_with_blockchain, AutoSync};
pub use token::{Role, TokenGateway, TokenSummary};

/// Exposes commonly used types when working with the token contracts.
pub mod prelude {
    pub use super::factory::{CreateTokenRequest, FactoryGateway, TokenFactoryApi};
    pub use super::sync::{sync_with_blockchain, AutoSync};
    pub use super::token::{Role, TokenGateway};
}
