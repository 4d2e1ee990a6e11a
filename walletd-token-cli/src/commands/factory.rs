//! Factory commands: fee, create, sync

use super::{contract_err, format_amount, parse_amount};
use crate::context::AppContext;
use anyhow::Result;
use clap::Args;
use walletd_erc20::{sync_with_blockchain, CreateTokenRequest, TokenFactoryApi};
use walletd_token_registry::{ChainAddress, Supply, MAX_DECIMALS};

#[derive(Args)]
pub struct CreateArgs {
    /// Token name
    #[arg(long)]
    pub name: String,

    /// Token symbol
    #[arg(long)]
    pub symbol: String,

    /// Initial supply in whole tokens, minted to the creator
    #[arg(long)]
    pub initial_supply: String,

    /// Supply cap in whole tokens
    #[arg(long)]
    pub max_supply: String,

    /// Decimal places
    #[arg(long, default_value_t = 18, value_parser = clap::value_parser!(u8).range(0..=MAX_DECIMALS as i64))]
    pub decimals: u8,
}

impl CreateArgs {
    fn into_request(self) -> Result<CreateTokenRequest> {
        let initial_supply = parse_amount(&self.initial_supply, self.decimals)?;
        let max_supply = parse_amount(&self.max_supply, self.decimals)?;
        anyhow::ensure!(
            initial_supply <= max_supply,
            "Initial supply exceeds max supply"
        );
        Ok(CreateTokenRequest {
            name: self.name,
            symbol: self.symbol,
            initial_supply: Supply::new(initial_supply),
            max_supply: Supply::new(max_supply),
            decimals: self.decimals,
        })
    }
}

pub async fn fee(ctx: &mut AppContext) -> Result<()> {
    let factory = ctx.factory()?;
    let fee = factory.creation_fee().await.map_err(contract_err)?;
    let network = &ctx.config.network;
    println!(
        "Creation fee: {} {}",
        format_amount(fee, network.currency_decimals),
        network.currency_symbol
    );
    Ok(())
}

pub async fn create(ctx: &mut AppContext, args: CreateArgs) -> Result<()> {
    let request = args.into_request()?;
    let factory = ctx.factory()?;
    let (creator, signer) = ctx.signer().await?;

    println!("Deploying {} ({})...", request.name, request.symbol);
    let record = factory
        .create_token(&signer, creator, &request)
        .await
        .map_err(contract_err)?;

    let owner = ChainAddress::from(creator);
    let address = record.address;
    let tx_hash = record.transaction_hash.clone();
    ctx.registry.add_token(&owner, record);

    println!("✅ Token created at {}", address.to_checksum());
    println!("   Transaction: {tx_hash}");
    if let Some(url) = ctx.config.network.explorer_tx_url(&tx_hash) {
        println!("   Explorer:    {url}");
    }
    Ok(())
}

pub async fn sync(ctx: &mut AppContext) -> Result<()> {
    let factory = ctx.factory()?;
    let owner = ctx.owner().await?;
    let network = ctx.config.network.clone();

    let count = sync_with_blockchain(&factory, &mut ctx.registry, &owner, &network)
        .await
        .map_err(contract_err)?;
    println!("✅ Synced {count} token(s) from the factory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn args(initial: &str, max: &str, decimals: u8) -> CreateArgs {
        CreateArgs {
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            initial_supply: initial.to_string(),
            max_supply: max.to_string(),
            decimals,
        }
    }

    #[test]
    fn test_request_scales_supplies() {
        let request = args("1000", "10000", 2).into_request().unwrap();
        assert_eq!(request.initial_supply.value(), U256::from(100_000u64));
        assert_eq!(request.max_supply.value(), U256::from(1_000_000u64));
        assert_eq!(request.decimals, 2);
    }

    #[test]
    fn test_request_rejects_initial_above_cap() {
        assert!(args("10", "1", 18).into_request().is_err());
    }

    #[test]
    fn test_request_rejects_bad_amount() {
        assert!(args("ten", "100", 18).into_request().is_err());
    }
}
