//! Mock chain node for local testing of the confidential bidding vault.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use mock_chain::DEFAULT_CHAIN_ID;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "Development node hosting the confidential bidding vault")]
struct Cli {
    /// Address to serve JSON-RPC on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Chain id reported to clients
    #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
    chain_id: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("cipherbid_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let (addr, handle) = mock_chain::spawn(cli.listen, cli.chain_id).await?;

    info!("Mock chain server running on {}. Press Ctrl+C to stop.", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
