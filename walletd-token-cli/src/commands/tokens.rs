//! Local registry commands

use super::format_amount;
use crate::context::AppContext;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use walletd_token_registry::{ChainAddress, MetadataPatch, TokenRecord, UserToken};

/// Owner override; defaults to the connected wallet
#[derive(Args)]
pub struct OwnerArg {
    /// Owner address instead of the connected wallet
    #[arg(long)]
    owner: Option<String>,
}

#[derive(Subcommand)]
pub enum TokensCommand {
    /// List the owner's tokens
    List {
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Show one token with its metadata
    Show {
        address: String,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Search by name, symbol or address
    Search {
        query: String,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Tokens on one chain
    Network {
        chain_id: u64,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Forget a token locally
    Remove {
        address: String,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Write the owner's tokens as a JSON export document
    Export {
        /// Output file, stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Merge tokens from an export document
    Import {
        file: PathBuf,
        #[command(flatten)]
        owner: OwnerArg,
    },

    /// Registry size and last save
    Stats,

    /// Delete every stored token and all metadata
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Every stored token across all owners
    All,
}

#[derive(Subcommand)]
pub enum MetadataCommand {
    /// Merge metadata fields into a token's entry
    Set {
        address: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        logo: Option<String>,
        /// Comma-separated tags, replacing any existing set
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        verified: Option<bool>,
    },

    /// Show a token's metadata
    Show { address: String },

    /// Drop a token's metadata
    Remove { address: String },
}

pub async fn execute(ctx: &mut AppContext, command: TokensCommand) -> Result<()> {
    match command {
        TokensCommand::List { owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            print_list(&ctx.registry.get_user_tokens(&owner));
        }
        TokensCommand::Show { address, owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            let address = ChainAddress::parse(&address)?;
            let token = ctx
                .registry
                .get_token(&owner, &address)
                .ok_or_else(|| anyhow!("Token {address} not found for {owner}"))?;
            print_details(&token, ctx);
        }
        TokensCommand::Search { query, owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            print_list(&ctx.registry.search_tokens(&owner, &query));
        }
        TokensCommand::Network { chain_id, owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            print_list(&ctx.registry.get_tokens_by_network(&owner, chain_id));
        }
        TokensCommand::Remove { address, owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            let address = ChainAddress::parse(&address)?;
            ctx.registry.remove_user_token(&owner, &address);
            println!("Removed {address}");
        }
        TokensCommand::Export { output, owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            let document = ctx.registry.export_user_data(&owner);
            anyhow::ensure!(!document.is_empty(), "Export failed");
            match output {
                Some(path) => {
                    std::fs::write(&path, document)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{document}"),
            }
        }
        TokensCommand::Import { file, owner } => {
            let owner = ctx.owner_or(owner.owner.as_deref()).await?;
            let payload = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            anyhow::ensure!(
                ctx.registry.import_user_data(&owner, &payload),
                "{} is not a token export document",
                file.display()
            );
            println!(
                "Imported; {} now has {} token(s)",
                owner,
                ctx.registry.get_user_tokens(&owner).len()
            );
        }
        TokensCommand::Stats => {
            let stats = ctx.registry.get_storage_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        TokensCommand::Clear { yes } => {
            anyhow::ensure!(yes, "Refusing to clear without --yes");
            ctx.registry.clear_all_data();
            println!("Cleared all token data");
        }
        TokensCommand::All => {
            let all = ctx.registry.get_all_tokens();
            for record in &all {
                println!("{}", summary_line(record));
            }
            println!("{} token(s)", all.len());
        }
    }
    Ok(())
}

pub fn metadata(ctx: &mut AppContext, command: MetadataCommand) -> Result<()> {
    match command {
        MetadataCommand::Set {
            address,
            description,
            website,
            logo,
            tags,
            verified,
        } => {
            let address = ChainAddress::parse(&address)?;
            let patch = MetadataPatch {
                description,
                website,
                logo,
                tags: tags.map(|t| t.into_iter().map(|s| s.trim().to_string()).collect()),
                is_verified: verified,
            };
            anyhow::ensure!(!patch.is_empty(), "Nothing to update");
            ctx.registry.update_token_metadata(&address, patch);
            println!("Updated metadata for {address}");
        }
        MetadataCommand::Show { address } => {
            let address = ChainAddress::parse(&address)?;
            match ctx.registry.get_token_metadata(&address) {
                Some(metadata) => println!("{}", serde_json::to_string_pretty(metadata)?),
                None => println!("No metadata for {address}"),
            }
        }
        MetadataCommand::Remove { address } => {
            let address = ChainAddress::parse(&address)?;
            ctx.registry.remove_token_metadata(&address);
            println!("Removed metadata for {address}");
        }
    }
    Ok(())
}

fn summary_line(record: &TokenRecord) -> String {
    format!(
        "{}  {:<8} {:<24} chain {}",
        record.address.to_checksum(),
        record.symbol,
        record.name,
        record.chain_id
    )
}

fn print_list(tokens: &[UserToken]) {
    if tokens.is_empty() {
        println!("No tokens");
        return;
    }
    for token in tokens {
        let verified = match token.metadata.as_ref().and_then(|m| m.is_verified) {
            Some(true) => " ✓",
            _ => "",
        };
        println!("{}{verified}", summary_line(&token.record));
    }
}

fn print_details(token: &UserToken, ctx: &AppContext) {
    let record = &token.record;
    println!("{} ({})", record.name, record.symbol);
    println!("  Address:        {}", record.address.to_checksum());
    println!("  Decimals:       {}", record.decimals);
    println!("  Initial supply: {}", format_amount(record.initial_supply.value(), record.decimals));
    println!("  Max supply:     {}", format_amount(record.max_supply.value(), record.decimals));
    println!("  Creator:        {}", record.creator.to_checksum());
    println!("  Network:        {} ({})", record.network, record.chain_id);
    if let Some(created) = chrono::DateTime::from_timestamp_millis(record.created_at as i64) {
        println!("  Created:        {}", created.to_rfc3339());
    }
    if !record.transaction_hash.is_empty() {
        println!("  Transaction:    {}", record.transaction_hash);
        if let Some(url) = ctx.config.network.explorer_tx_url(&record.transaction_hash) {
            println!("  Explorer:       {url}");
        }
    }
    if let Some(metadata) = &token.metadata {
        if let Some(description) = &metadata.description {
            println!("  Description:    {description}");
        }
        if let Some(website) = &metadata.website {
            println!("  Website:        {website}");
        }
        if let Some(logo) = &metadata.logo {
            println!("  Logo:           {logo}");
        }
        if let Some(tags) = &metadata.tags {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            println!("  Tags:           {}", tags.join(", "));
        }
        if let Some(verified) = metadata.is_verified {
            println!("  Verified:       {verified}");
        }
    }
}
