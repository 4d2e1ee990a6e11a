//! Command definitions and dispatch

mod factory;
mod token;
mod tokens;
mod wallet;

use crate::context::AppContext;
use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use walletd_error::ContractError;

use factory::CreateArgs;
use token::TokenCommand;
use tokens::{MetadataCommand, TokensCommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Connect the wallet and show the active account
    Connect,

    /// Show configuration, wallet and registry state
    Status,

    /// Show the factory's token creation fee
    Fee,

    /// Deploy a new token through the factory
    Create(CreateArgs),

    /// Pull every token the connected account created from the factory
    Sync,

    /// Locally stored tokens
    #[command(subcommand)]
    Tokens(TokensCommand),

    /// Token metadata
    #[command(subcommand)]
    Metadata(MetadataCommand),

    /// Read or manage a deployed token contract
    #[command(subcommand)]
    Token(TokenCommand),
}

pub async fn execute(command: Commands, ctx: &mut AppContext) -> Result<()> {
    match command {
        Commands::Connect => wallet::connect(ctx).await,
        Commands::Status => wallet::status(ctx),
        Commands::Fee => factory::fee(ctx).await,
        Commands::Create(args) => factory::create(ctx, args).await,
        Commands::Sync => factory::sync(ctx).await,
        Commands::Tokens(cmd) => tokens::execute(ctx, cmd).await,
        Commands::Metadata(cmd) => tokens::metadata(ctx, cmd),
        Commands::Token(cmd) => token::execute(ctx, cmd).await,
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Wraps a contract failure in its user-facing message.
pub(crate) fn contract_err(err: ContractError) -> anyhow::Error {
    anyhow!(err.user_message())
}

/// `amount` base units rendered with `decimals` places
pub(crate) fn format_amount(amount: U256, decimals: u8) -> String {
    format_units(amount, decimals).unwrap_or_else(|_| amount.to_string())
}

/// Whole-token amount such as `"1.5"` scaled to base units.
pub(crate) fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let parsed = parse_units(amount.trim(), decimals)
        .map_err(|e| anyhow!("Invalid amount '{amount}': {e}"))?;
    if parsed.is_negative() {
        return Err(anyhow!("Invalid amount '{amount}': must not be negative"));
    }
    Ok(parsed.get_absolute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_scales() {
        assert_eq!(parse_amount("1", 18).unwrap(), U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount("1000", 0).unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("abc", 18).is_err());
        assert!(parse_amount("-1", 18).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert!(format_amount(U256::from(1_500_000u64), 6).starts_with("1.5"));
        assert!(format_amount(U256::from(10u64).pow(U256::from(18u64)), 18).starts_with("1."));
    }

    #[test]
    fn test_contract_err_uses_user_message() {
        let err = contract_err(ContractError::Rejected);
        assert_eq!(err.to_string(), ContractError::Rejected.user_message());
    }
}
