//! Vault contract storage.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use cipherbid_types::{AuctionTuple, Handle};

/// One stored auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionRecord {
    pub id: U256,
    pub title: String,
    pub description: String,
    pub creator: Address,
    pub starting_bid: U256,
    /// Reserved tuple slot, always zero in this vault
    pub reserved: B256,
    pub highest_bidder: Address,
    pub end_time: U256,
    pub ended: bool,
    pub finalized: bool,
}

impl AuctionRecord {
    /// ABI tuple in contract field order.
    pub fn to_tuple(&self) -> AuctionTuple {
        (
            self.id,
            self.title.clone(),
            self.description.clone(),
            self.creator,
            self.starting_bid,
            self.reserved,
            self.highest_bidder,
            self.end_time,
            self.ended,
            self.finalized,
        )
    }
}

/// Vault contract state.
#[derive(Debug, Default)]
pub struct VaultState {
    /// Auctions in id order; auction `n` lives at index `n - 1`
    pub auctions: Vec<AuctionRecord>,

    /// Encrypted bid handles: (auction_id, bidder) -> handle
    pub bids: HashMap<(U256, Address), Handle>,
}

impl VaultState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created auction receives.
    pub fn next_auction_id(&self) -> U256 {
        U256::from(self.auctions.len() as u64 + 1)
    }

    pub fn get_auction(&self, auction_id: U256) -> Option<&AuctionRecord> {
        let index = Self::index_of(auction_id)?;
        self.auctions.get(index)
    }

    pub fn get_auction_mut(&mut self, auction_id: U256) -> Option<&mut AuctionRecord> {
        let index = Self::index_of(auction_id)?;
        self.auctions.get_mut(index)
    }

    fn index_of(auction_id: U256) -> Option<usize> {
        let id: usize = auction_id.try_into().ok()?;
        id.checked_sub(1)
    }
}
