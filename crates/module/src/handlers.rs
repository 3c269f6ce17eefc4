//! Call handlers for the vault contract.
//!
//! These functions implement the state-changing entry points.

use alloy_primitives::{Address, Bytes, U256};
use tracing::info;

use cipherbid_crypto::Coprocessor;
use cipherbid_types::{Handle, VaultCall};

use crate::error::VaultError;
use crate::state::{AuctionRecord, VaultState};

const SECONDS_PER_HOUR: u64 = 3_600;

/// Context provided by the runtime for each call.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Address of the vault being called
    pub contract: Address,
    /// Current block timestamp
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, VaultError>;

/// Dispatch a call to its handler.
pub fn handle_call(
    state: &mut VaultState,
    coprocessor: &mut Coprocessor,
    ctx: &CallContext,
    call: &VaultCall,
) -> HandlerResult<()> {
    match call {
        VaultCall::CreateAuction {
            title,
            description,
            starting_bid,
            duration_hours,
        } => handle_create_auction(
            state,
            ctx,
            title.clone(),
            description.clone(),
            *starting_bid,
            *duration_hours,
        )
        .map(|_| ()),
        VaultCall::PlaceBid {
            auction_id,
            handle,
            input_proof,
        } => handle_place_bid(state, coprocessor, ctx, *auction_id, *handle, input_proof),
    }
}

/// Handle `createAuction`. Returns the new auction id.
pub fn handle_create_auction(
    state: &mut VaultState,
    ctx: &CallContext,
    title: String,
    description: String,
    starting_bid: U256,
    duration_hours: U256,
) -> HandlerResult<U256> {
    if starting_bid.is_zero() {
        return Err(VaultError::InvalidStartingBid);
    }
    if duration_hours.is_zero() {
        return Err(VaultError::InvalidDuration);
    }

    let id = state.next_auction_id();
    let end_time = U256::from(ctx.timestamp)
        .saturating_add(duration_hours.saturating_mul(U256::from(SECONDS_PER_HOUR)));

    state.auctions.push(AuctionRecord {
        id,
        title,
        description,
        creator: ctx.sender,
        starting_bid,
        reserved: Default::default(),
        highest_bidder: Address::ZERO,
        end_time,
        ended: false,
        finalized: false,
    });

    info!(auction_id = %id, creator = %ctx.sender, "Auction created");
    Ok(id)
}

/// Handle `placeBid`.
///
/// The proof must have been produced for `(contract, sender)`. The bidder is
/// granted the right to reveal their own handle. A repeat bid replaces the
/// bidder's previous handle.
pub fn handle_place_bid(
    state: &mut VaultState,
    coprocessor: &mut Coprocessor,
    ctx: &CallContext,
    auction_id: U256,
    handle: Handle,
    input_proof: &Bytes,
) -> HandlerResult<()> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(VaultError::AuctionNotFound(auction_id))?;

    if auction.ended || U256::from(ctx.timestamp) >= auction.end_time {
        return Err(VaultError::AuctionEnded(auction_id));
    }

    coprocessor.verify_input(ctx.contract, ctx.sender, handle, input_proof)?;
    coprocessor.allow(handle, ctx.sender)?;

    let previous = state.bids.insert((auction_id, ctx.sender), handle);

    info!(
        auction_id = %auction_id,
        bidder = %ctx.sender,
        replaced = previous.is_some(),
        "Encrypted bid placed"
    );
    Ok(())
}
