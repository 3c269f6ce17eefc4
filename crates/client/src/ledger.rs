//! Ledger connection consumed by the client.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use cipherbid_types::{AuctionTuple, Handle, TxHash, TxReceipt, VaultCall};

use crate::error::ClientResult;

/// Read and write access to deployed vault contracts.
///
/// Implementations own their own transport timeouts.
#[async_trait]
pub trait VaultLedger: Send + Sync {
    /// `getAuctionCount()`.
    async fn auction_count(&self, contract: Address) -> ClientResult<U256>;

    /// `getAuction(id)` as the raw ten-field tuple.
    async fn auction(&self, contract: Address, auction_id: U256) -> ClientResult<AuctionTuple>;

    /// `getBid(id, account)`. The zero word means no bid.
    async fn bid_handle(
        &self,
        contract: Address,
        auction_id: U256,
        account: Address,
    ) -> ClientResult<Handle>;

    /// Submit a state-changing call on behalf of `from`.
    async fn send_transaction(
        &self,
        from: Address,
        contract: Address,
        call: VaultCall,
    ) -> ClientResult<TxHash>;

    /// Wait until `tx_hash` is included and return its receipt.
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> ClientResult<TxReceipt>;
}
