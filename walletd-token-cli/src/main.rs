//! WalletD Token Studio CLI
//!
//! Creates ERC-20 tokens through the token factory, keeps a local registry
//! of them and manages deployed tokens. Configuration comes from the
//! environment or a `.env` file; see `config.rs` for the variables.

mod commands;
mod config;
mod context;

use anyhow::{anyhow, Result};
use clap::Parser;
use commands::Commands;
use config::AppConfig;
use context::AppContext;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,walletd_token=info,walletd_erc20=info";

#[derive(Parser)]
#[command(name = "walletd-token")]
#[command(about = "WalletD Token Studio - create and manage ERC-20 tokens", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(cli.verbose)?;

    let config = AppConfig::from_env()?;
    debug!(?config, "Loaded configuration");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let mut ctx = AppContext::new(config)?;
        commands::execute(cli.command, &mut ctx).await
    })
}

/// Installs the fmt subscriber on stderr. `RUST_LOG` wins over the default
/// filter.
fn init_logging(verbose: bool) -> Result<()> {
    let fallback = if verbose { "debug" } else { DEFAULT_LOG_FILTER };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to set the global tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_commands() {
        let cli = Cli::try_parse_from(["walletd-token", "tokens", "list", "--owner", "0xaa"]).unwrap();
        assert!(matches!(cli.command, Commands::Tokens(_)));

        let cli = Cli::try_parse_from([
            "walletd-token",
            "token",
            "grant-role",
            "0xbb",
            "minter",
            "0xaa",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Token(_)));

        assert!(Cli::try_parse_from(["walletd-token", "token", "grant-role", "0xbb", "owner", "0xaa"]).is_err());
    }

    #[test]
    fn test_create_decimals_bounded() {
        let base = ["walletd-token", "create", "--name", "T", "--symbol", "T", "--initial-supply", "1", "--max-supply", "2"];
        assert!(Cli::try_parse_from(base).is_ok());
        let mut too_many: Vec<&str> = base.to_vec();
        too_many.extend(["--decimals", "19"]);
        assert!(Cli::try_parse_from(too_many).is_err());
    }
}
