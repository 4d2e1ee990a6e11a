//! Pulling factory-indexed tokens into the local registry

use crate::factory::TokenFactoryApi;
use tracing::{debug, info};
use walletd_error::ContractError;
use walletd_session::{NetworkConfig, WalletSession};
use walletd_token_registry::{ChainAddress, TokenRegistry};

/// Fetches every token `owner` deployed through the factory and merges each
/// into the registry. Returns the number of records applied.
///
/// Re-running is harmless: records are keyed by token address, and an empty
/// transaction hash never overwrites a known one.
pub async fn sync_with_blockchain(
    factory: &dyn TokenFactoryApi,
    registry: &mut TokenRegistry,
    owner: &ChainAddress,
    network: &NetworkConfig,
) -> Result<usize, ContractError> {
    let tokens = factory.tokens_by_creator(owner.as_address()).await?;
    let count = tokens.len();
    for token in tokens {
        registry.add_token(owner, token.into_record(network, String::new()));
    }
    info!(owner = %owner, count, chain_id = network.chain_id, "Synced tokens from factory");
    Ok(count)
}

/// One-shot sync policy for a session.
///
/// The first time the session has a signer and the registry holds nothing
/// for the owner on the target chain, a sync runs. After that the policy is
/// spent for the lifetime of this value, whether or not the sync succeeded.
/// Tokens created elsewhere are not picked up once anything is stored
/// locally; an explicit [`sync_with_blockchain`] call covers that.
#[derive(Debug, Default)]
pub struct AutoSync {
    fired: bool,
}

impl AutoSync {
    /// A policy that has not fired yet
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a sync has been attempted
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Runs the sync if the policy applies now. Returns the number of
    /// records applied, or `None` when nothing ran.
    pub async fn maybe_sync(
        &mut self,
        session: &WalletSession,
        factory: &dyn TokenFactoryApi,
        registry: &mut TokenRegistry,
    ) -> Result<Option<usize>, ContractError> {
        if self.fired || session.signer().is_err() {
            return Ok(None);
        }
        let Some(address) = session.address() else {
            return Ok(None);
        };

        let owner = ChainAddress::from(address);
        let network = session.network();
        if !registry.is_empty_for(&owner, network.chain_id) {
            debug!(owner = %owner, "Local tokens present, skipping auto-sync");
            return Ok(None);
        }

        self.fired = true;
        sync_with_blockchain(factory, registry, &owner, network)
            .await
            .map(Some)
    }
}
