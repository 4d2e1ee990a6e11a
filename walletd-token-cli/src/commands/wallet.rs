//! Wallet connection commands

use super::format_amount;
use crate::context::AppContext;
use anyhow::Result;
use walletd_session::{NetworkStatus, WalletAvailability};

pub async fn connect(ctx: &mut AppContext) -> Result<()> {
    let account = ctx.connect().await?;
    let network = ctx.session.network();

    println!("✅ Connected");
    println!("   Address: {}", account.address);
    println!("   Network: {} (chain {})", network.name, account.chain_id);
    println!(
        "   Balance: {} {}",
        format_amount(account.balance, network.currency_decimals),
        network.currency_symbol
    );
    if account.network_status != NetworkStatus::Correct {
        println!("⚠️  Wallet is not on {}", network.name);
    }
    Ok(())
}

pub fn status(ctx: &AppContext) -> Result<()> {
    let network = &ctx.config.network;
    println!("Network:   {} (chain {}, {})", network.name, network.chain_id, network.chain_id_hex());
    println!("RPC:       {}", network.rpc_url().unwrap_or("-"));
    if let Some(explorer) = &network.block_explorer_url {
        println!("Explorer:  {explorer}");
    }
    match ctx.config.factory_address {
        Some(address) => println!("Factory:   {address}"),
        None => println!("Factory:   not configured (set TOKEN_FACTORY_ADDRESS)"),
    }
    println!("Data dir:  {}", ctx.config.data_dir.display());

    match ctx.session.availability() {
        WalletAvailability::Installed => println!("Wallet:    configured"),
        WalletAvailability::NotInstalled => println!("Wallet:    none (set WALLET_PRIVATE_KEY)"),
    }

    let stats = ctx.registry.get_storage_stats();
    println!(
        "Registry:  {} tokens across {} owners, {} bytes",
        stats.token_count, stats.user_count, stats.storage_bytes
    );
    if let Some(last_sync) = stats.last_sync.and_then(|ms| chrono::DateTime::from_timestamp_millis(ms as i64)) {
        println!("Last save: {}", last_sync.to_rfc3339());
    }
    Ok(())
}
