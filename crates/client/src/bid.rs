//! Transaction submission: auction creation and sealed bids.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use tracing::{debug, info};

use cipherbid_types::{Handle, TxReceipt, VaultCall};

use crate::error::{ClientError, ClientResult};
use crate::ledger::VaultLedger;
use crate::service::ConfidentialService;
use crate::wallet::WalletSigner;

pub const STATUS_CREATING_AUCTION: &str = "Creating auction...";
pub const STATUS_AUCTION_CREATED: &str = "Auction created";
pub const STATUS_ENCRYPTING_BID: &str = "Encrypting bid...";
pub const STATUS_SUBMITTING_BID: &str = "Submitting encrypted bid...";
pub const STATUS_BID_SUBMITTED: &str = "Bid submitted";

/// Parameters for `createAuction`, as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAuctionRequest {
    pub title: String,
    pub description: String,
    /// Decimal text; floored to an integer
    pub starting_bid: String,
    /// Coerced to at least one hour
    pub duration_hours: u64,
}

impl CreateAuctionRequest {
    /// Validate and convert into the contract call.
    pub fn into_call(self) -> ClientResult<VaultCall> {
        let starting_bid = parse_positive_amount("startingBid", &self.starting_bid)?;
        Ok(VaultCall::CreateAuction {
            title: self.title,
            description: self.description,
            starting_bid,
            duration_hours: U256::from(self.duration_hours.max(1)),
        })
    }
}

/// A cleartext bid to seal and submit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceBidRequest {
    pub auction_id: U256,
    pub clear_bid: f64,
}

impl PlaceBidRequest {
    /// The bid as an unsigned 64-bit amount, floored.
    pub fn amount(&self) -> ClientResult<u64> {
        let value = self.clear_bid;
        if !value.is_finite() || value <= 0.0 {
            return Err(ClientError::invalid("clearBid", "must be a positive number"));
        }
        let floored = value.floor();
        if floored >= u64::MAX as f64 {
            return Err(ClientError::invalid("clearBid", "exceeds the 64-bit bid range"));
        }
        Ok(floored as u64)
    }
}

/// Parse positive decimal text and floor it. Fractions below 1 floor to 0.
fn parse_positive_amount(field: &'static str, text: &str) -> ClientResult<U256> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ClientError::invalid(field, format!("{text:?} is not a number")))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ClientError::invalid(field, "must be a positive number"));
    }
    let floored = value.floor();
    U256::from_str(&format!("{floored:.0}"))
        .map_err(|_| ClientError::invalid(field, "exceeds the 256-bit range"))
}

/// Everything a write needs. Built by the session once preconditions hold.
#[derive(Clone)]
pub struct WriteContext {
    pub contract: Address,
    pub ledger: Arc<dyn VaultLedger>,
    pub signer: Arc<dyn WalletSigner>,
    pub service: Arc<dyn ConfidentialService>,
}

impl WriteContext {
    /// Send `call` from the connected account and wait for inclusion.
    pub async fn submit(&self, call: VaultCall) -> ClientResult<TxReceipt> {
        let from = self.signer.address();
        let method = call.name();

        let tx_hash = self
            .ledger
            .send_transaction(from, self.contract, call)
            .await?;
        debug!(method, tx_hash = %tx_hash, "Transaction sent");

        let receipt = self.ledger.wait_for_inclusion(tx_hash).await?;
        if !receipt.status {
            let reason = receipt
                .revert_reason
                .clone()
                .unwrap_or_else(|| "execution reverted".to_string());
            return Err(ClientError::Reverted { tx_hash, reason });
        }

        info!(
            method,
            tx_hash = %tx_hash,
            block = receipt.block_number,
            "Transaction included"
        );
        Ok(receipt)
    }

    /// Seal `amount` as a 64-bit input bound to this contract and account.
    pub async fn seal_bid(&self, amount: u64) -> ClientResult<(Handle, Bytes)> {
        let mut input = self
            .service
            .create_encrypted_input(self.contract, self.signer.address());
        input.add64(amount);

        let sealed = self.service.encrypt(input).await?;
        let handle = sealed
            .handles
            .first()
            .copied()
            .ok_or_else(|| ClientError::Transport("coprocessor returned no handles".to_string()))?;
        Ok((handle, sealed.input_proof))
    }

    /// Seal and submit a bid, reporting progress through `on_status`.
    pub async fn place_encrypted_bid(
        &self,
        auction_id: U256,
        amount: u64,
        on_status: impl Fn(&'static str),
    ) -> ClientResult<TxReceipt> {
        on_status(STATUS_ENCRYPTING_BID);
        let (handle, input_proof) = self.seal_bid(amount).await?;

        on_status(STATUS_SUBMITTING_BID);
        let receipt = self
            .submit(VaultCall::PlaceBid {
                auction_id,
                handle,
                input_proof,
            })
            .await?;

        on_status(STATUS_BID_SUBMITTED);
        Ok(receipt)
    }
}
