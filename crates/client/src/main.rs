//! CLI for the confidential bidding vault.
//!
//! This binary provides commands for:
//! - Listing auctions
//! - Creating auctions
//! - Submitting encrypted bids
//! - Decrypting your own bid

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::U256;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use cipherbid_client::rpc::{self, RpcCoprocessor, RpcLedger};
use cipherbid_client::{
    ClientConfig, CreateAuctionRequest, FileStorage, LedgerClock, LocalWallet, PlaceBidRequest,
    Session, WalletSigner,
};

#[derive(Parser)]
#[command(name = "cipherbid")]
#[command(about = "CLI for confidential sealed-bid auctions")]
struct Cli {
    /// Ledger and relayer RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    /// Network to bind; defaults to the endpoint's chain
    #[arg(long)]
    chain_id: Option<u64>,

    /// JSON config with the deployment table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the wallet key and stored authorizations
    #[arg(long, default_value = ".cipherbid")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show chain, contract and wallet
    Info,

    /// List all auctions
    List,

    /// Create a new auction
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Starting bid; fractional values are floored
        #[arg(long)]
        starting_bid: String,

        /// Duration in hours (minimum 1)
        #[arg(long, default_value = "24")]
        duration_hours: u64,
    },

    /// Submit an encrypted bid
    Bid {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Bid amount (will be encrypted)
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
    },

    /// Decrypt your own bid on an auction
    Decrypt {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Advance chain time (for testing)
    AdvanceTime {
        /// Seconds to add
        #[arg(long)]
        seconds: u64,
    },
}

fn print_auctions(session: &Session) -> Result<()> {
    let snapshot = session.snapshot();
    if let Some(error) = snapshot.error {
        return Err(anyhow!(error));
    }

    match snapshot.auctions {
        None => println!("No vault deployed on this network"),
        Some(auctions) if auctions.is_empty() => println!("No auctions found"),
        Some(auctions) => {
            println!("Auctions:");
            for a in auctions {
                let status = match (a.ended, a.finalized) {
                    (_, true) => "finalized",
                    (true, false) => "ended",
                    (false, false) => "open",
                };
                println!("  [{}] {} ({})", a.id, a.title, status);
                if !a.description.is_empty() {
                    println!("      {}", a.description);
                }
                println!("      Creator: {}", a.creator);
                println!("      Starting bid: {}", a.starting_bid);
                println!("      Ends: {}", a.end_time);
                if a.has_highest_bidder() {
                    println!("      Highest bidder: {}", a.highest_bidder);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cipherbid=info".parse()?)
                .add_directive("cipherbid_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = rpc::connect(&cli.rpc)?;
    let chain = rpc::chain_info(&client)
        .await
        .with_context(|| format!("Failed to reach {}", cli.rpc))?;

    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if config.deployments.is_empty() {
        config.deployments.insert(chain.chain_id, chain.vault_address);
    }

    let wallet = Arc::new(LocalWallet::load_or_create(&cli.data_dir.join("wallet.json"))?);
    let storage = Arc::new(FileStorage::new(cli.data_dir.join("authorizations.json")));
    let chain_id = cli.chain_id.unwrap_or(chain.chain_id);

    let session = Session::new(config.clone())
        .with_ledger(Arc::new(RpcLedger::new(client.clone(), &config)))
        .with_service(Arc::new(RpcCoprocessor::new(client.clone())))
        .with_signer(wallet.clone())
        .with_storage(storage)
        .with_clock(Arc::new(LedgerClock::anchored(chain.timestamp)))
        .with_chain_id(Some(chain_id));

    match cli.command {
        Commands::Info => {
            println!("Chain ID: {}", chain.chain_id);
            println!("Block: {} (timestamp {})", chain.block_number, chain.timestamp);
            match session.contract_address() {
                Some(address) => println!("Vault: {}", address),
                None => println!("Vault: not deployed on chain {}", chain_id),
            }
            println!("Wallet: {}", wallet.address());
        }

        Commands::List => {
            session.mount().await;
            print_auctions(&session)?;
        }

        Commands::Create {
            title,
            description,
            starting_bid,
            duration_hours,
        } => {
            let receipt = session
                .create_auction(CreateAuctionRequest {
                    title,
                    description,
                    starting_bid,
                    duration_hours,
                })
                .await?;
            info!(tx_hash = %receipt.tx_hash, "Auction created");
            println!("Auction created in block {}", receipt.block_number);
            print_auctions(&session)?;
        }

        Commands::Bid { auction_id, amount } => {
            let receipt = session
                .place_encrypted_bid(PlaceBidRequest {
                    auction_id: U256::from(auction_id),
                    clear_bid: amount,
                })
                .await?;
            println!("Bid submitted successfully");
            println!("  Auction ID: {}", auction_id);
            println!("  Amount: {} (encrypted)", amount.floor());
            println!("  Transaction: {}", receipt.tx_hash);
        }

        Commands::Decrypt { auction_id } => {
            let value = session.decrypt_my_bid(U256::from(auction_id)).await?;
            println!("Your bid on auction {}: {}", auction_id, value);
        }

        Commands::AdvanceTime { seconds } => {
            let info = rpc::advance_time(&client, seconds).await?;
            println!(
                "Time advanced: block={}, timestamp={}",
                info.block_number, info.timestamp
            );
        }
    }

    Ok(())
}
