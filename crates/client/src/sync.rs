//! Read-model synchronization.

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use cipherbid_types::AuctionView;

use crate::error::{ClientError, ClientResult};
use crate::ledger::VaultLedger;

/// Fetch every auction of `contract`, ids `1..=count`, in order.
///
/// Reads are sequential to bound load on the endpoint.
pub async fn fetch_auctions(
    ledger: &dyn VaultLedger,
    contract: Address,
) -> ClientResult<Vec<AuctionView>> {
    let total = ledger.auction_count(contract).await?;
    let count = u64::try_from(total)
        .map_err(|_| ClientError::Transport(format!("auction count {total} out of range")))?;

    let mut items = Vec::with_capacity(count.min(1024) as usize);
    for id in 1..=count {
        let tuple = ledger.auction(contract, U256::from(id)).await?;
        debug!(contract = %contract, auction_id = id, "Fetched auction");
        items.push(AuctionView::from_tuple(tuple));
    }

    info!(contract = %contract, count, "Fetched auctions");
    Ok(items)
}
