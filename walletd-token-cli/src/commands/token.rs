//! Managed token contract commands

use super::{contract_err, format_amount, parse_amount};
use crate::context::AppContext;
use alloy::primitives::{Address, U256};
use anyhow::Result;
use clap::Subcommand;
use walletd_erc20::{Role, TokenGateway};
use walletd_token_registry::ChainAddress;

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Name, symbol, supplies and pause state
    Info {
        address: String,
        /// Also show this account's balance
        #[arg(long)]
        holder: Option<String>,
    },

    /// Send tokens from the connected account
    Transfer {
        address: String,
        to: String,
        /// Amount in whole tokens
        amount: String,
    },

    /// Mint new tokens (minter role)
    Mint {
        address: String,
        to: String,
        /// Amount in whole tokens
        amount: String,
    },

    /// Burn tokens held by the connected account
    Burn {
        address: String,
        /// Amount in whole tokens
        amount: String,
    },

    /// Pause transfers (pauser role)
    Pause { address: String },

    /// Resume transfers (pauser role)
    Unpause { address: String },

    /// Grant admin, minter, pauser or burner
    GrantRole {
        address: String,
        role: Role,
        account: String,
    },

    /// Revoke admin, minter, pauser or burner
    RevokeRole {
        address: String,
        role: Role,
        account: String,
    },

    /// Check whether an account holds a role
    HasRole {
        address: String,
        role: Role,
        account: String,
    },
}

pub async fn execute(ctx: &mut AppContext, command: TokenCommand) -> Result<()> {
    match command {
        TokenCommand::Info { address, holder } => {
            let token = gateway(ctx, &address)?;
            let summary = token.summary().await.map_err(contract_err)?;
            println!("{} ({})", summary.name, summary.symbol);
            println!("  Decimals:     {}", summary.decimals);
            println!("  Total supply: {}", format_amount(summary.total_supply, summary.decimals));
            println!("  Max supply:   {}", format_amount(summary.max_supply, summary.decimals));
            println!("  Paused:       {}", summary.paused);
            if let Some(holder) = holder {
                let holder = parse_account(&holder)?;
                let balance = token.balance_of(holder).await.map_err(contract_err)?;
                println!("  Balance:      {}", format_amount(balance, summary.decimals));
            }
        }
        TokenCommand::Transfer { address, to, amount } => {
            let token = gateway(ctx, &address)?;
            let amount = scaled(&token, &amount).await?;
            let to = parse_account(&to)?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.transfer(&signer, to, amount).await.map_err(contract_err)?;
            report(ctx, "Transfer", &hash);
        }
        TokenCommand::Mint { address, to, amount } => {
            let token = gateway(ctx, &address)?;
            let amount = scaled(&token, &amount).await?;
            let to = parse_account(&to)?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.mint(&signer, to, amount).await.map_err(contract_err)?;
            report(ctx, "Mint", &hash);
        }
        TokenCommand::Burn { address, amount } => {
            let token = gateway(ctx, &address)?;
            let amount = scaled(&token, &amount).await?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.burn(&signer, amount).await.map_err(contract_err)?;
            report(ctx, "Burn", &hash);
        }
        TokenCommand::Pause { address } => {
            let token = gateway(ctx, &address)?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.pause(&signer).await.map_err(contract_err)?;
            report(ctx, "Pause", &hash);
        }
        TokenCommand::Unpause { address } => {
            let token = gateway(ctx, &address)?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.unpause(&signer).await.map_err(contract_err)?;
            report(ctx, "Unpause", &hash);
        }
        TokenCommand::GrantRole { address, role, account } => {
            let token = gateway(ctx, &address)?;
            let account = parse_account(&account)?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.grant_role(&signer, role, account).await.map_err(contract_err)?;
            report(ctx, &format!("Grant {role}"), &hash);
        }
        TokenCommand::RevokeRole { address, role, account } => {
            let token = gateway(ctx, &address)?;
            let account = parse_account(&account)?;
            let (_, signer) = ctx.signer().await?;
            let hash = token.revoke_role(&signer, role, account).await.map_err(contract_err)?;
            report(ctx, &format!("Revoke {role}"), &hash);
        }
        TokenCommand::HasRole { address, role, account } => {
            let token = gateway(ctx, &address)?;
            let account = parse_account(&account)?;
            let held = token.has_role(role, account).await.map_err(contract_err)?;
            println!("{account} {} {role}", if held { "has" } else { "does not have" });
        }
    }
    Ok(())
}

fn gateway(ctx: &AppContext, address: &str) -> Result<TokenGateway> {
    ctx.token(&ChainAddress::parse(address)?)
}

fn parse_account(raw: &str) -> Result<Address> {
    Ok(ChainAddress::parse(raw)?.as_address())
}

/// Whole-token amount in the token's own base units
async fn scaled(token: &TokenGateway, amount: &str) -> Result<U256> {
    let decimals = token.decimals().await.map_err(contract_err)?;
    parse_amount(amount, decimals)
}

fn report(ctx: &AppContext, action: &str, hash: &str) {
    println!("✅ {action} confirmed: {hash}");
    if let Some(url) = ctx.config.network.explorer_tx_url(hash) {
        println!("   Explorer: {url}");
    }
}
