//! Thin administration binary over the oracle's persistent store. No
//! pricing or filter logic lives here — every subcommand is a direct
//! `Store` call.

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use oracle_config::OracleConfig;
use oracle_store::{ClearTarget, Store};
use std::io::Write;

#[derive(Debug, Parser)]
#[command(name = "oracle-cli", about = "Administer the oracle's persistent store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print row counts for every cached table.
    Info,
    /// Reclaim disk space (a no-op on Postgres).
    Vacuum,
    /// Delete cached prices for one token or one block.
    Clear(ClearArgs),
    /// Drop every cached row.
    Nuke {
        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("scope").required(true).args(["token", "block"])))]
struct ClearArgs {
    /// Token address (0x...) or symbol to clear cached prices for.
    #[arg(long)]
    token: Option<String>,
    /// Block number to clear cached prices for.
    #[arg(long)]
    block: Option<u64>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = OracleConfig::from_env()?;
    let chain = config.chain;
    let store = Store::connect(&config).await?;

    match cli.command {
        Command::Info => {
            let info = store.info().await?;
            println!("chains:       {}", info.chains);
            println!("tokens:       {}", info.tokens);
            println!("prices:       {}", info.prices);
            println!("log caches:   {}", info.log_caches);
            println!("trace caches: {}", info.trace_caches);
        }
        Command::Vacuum => {
            store.vacuum().await?;
            tracing::info!("vacuum complete");
        }
        Command::Clear(args) => {
            let deleted = if let Some(block) = args.block {
                println!("Deleting prices for block {block}");
                store.clear(chain, ClearTarget::Block(block)).await?
            } else {
                let token = args.token.expect("clap group requires token or block");
                println!("Deleting prices for {token}");
                let target = match token.parse::<Address>() {
                    Ok(addr) => ClearTarget::Address(addr),
                    Err(_) => ClearTarget::Symbol(&token),
                };
                store.clear(chain, target).await?
            };
            println!("Deleted {deleted} price rows.");
        }
        Command::Nuke { force } => {
            if !force {
                print!("Are you sure you want to drop all tables in the database? [y/N]: ");
                std::io::stdout().flush().ok();
                let mut confirm = String::new();
                std::io::stdin().read_line(&mut confirm)?;
                let confirm = confirm.trim().to_lowercase();
                if confirm != "y" && confirm != "yes" {
                    println!("Operation cancelled.");
                    return Ok(());
                }
            }
            store.nuke().await?;
            println!("All tables dropped; database cleared.");
        }
    }

    Ok(())
}
