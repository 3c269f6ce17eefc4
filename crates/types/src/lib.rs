//! Core type definitions for the confidential bidding vault.
//!
//! This crate provides the value types shared by the client, the in-memory
//! vault contract and the mock ledger: the public auction read-model, the
//! positional tuple returned by the contract, deployment bindings, ledger
//! calls and receipts, encrypted inputs and decryption authorizations.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

pub mod authorization;
pub mod input;

pub use authorization::{
    AuthorizationMessage, ClearValue, DecryptionAuthorization, EphemeralKeyPair,
    HandleContractPair, UserDecryptRequest, SECONDS_PER_DAY,
};
pub use input::{EncryptedInput, SealedInput, TypedPlaintext, MAX_INPUT_BITS};

/// Opaque reference to a ciphertext held by the coprocessor.
pub type Handle = B256;

/// Transaction hash assigned by the ledger.
pub type TxHash = B256;

// =========================
// AUCTION READ-MODEL
// =========================

/// Raw auction tuple as returned by `getAuction(id)`.
///
/// Field order is fixed by the contract ABI:
/// `(id, title, description, creator, startingBid, reserved, highestBidder,
/// endTime, ended, finalized)`. Ordinal 5 is a reserved word the client
/// never interprets.
pub type AuctionTuple = (
    U256,
    String,
    String,
    Address,
    U256,
    B256,
    Address,
    U256,
    bool,
    bool,
);

/// Public view of one on-chain auction.
///
/// Snapshots are replaced wholesale on every refresh, never patched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionView {
    pub id: U256,
    pub title: String,
    pub description: String,
    pub creator: Address,
    /// Starting bid in ledger-native units
    pub starting_bid: U256,
    /// Zero address when nobody has bid
    pub highest_bidder: Address,
    /// Unix timestamp
    pub end_time: U256,
    pub ended: bool,
    pub finalized: bool,
}

impl AuctionView {
    /// Map a contract tuple positionally into a view.
    pub fn from_tuple(tuple: AuctionTuple) -> Self {
        let (
            id,
            title,
            description,
            creator,
            starting_bid,
            _reserved,
            highest_bidder,
            end_time,
            ended,
            finalized,
        ) = tuple;

        Self {
            id,
            title,
            description,
            creator,
            starting_bid,
            highest_bidder,
            end_time,
            ended,
            finalized,
        }
    }

    /// Whether anyone has bid yet.
    pub fn has_highest_bidder(&self) -> bool {
        self.highest_bidder != Address::ZERO
    }
}

// =========================
// CONTRACT BINDING
// =========================

/// One entry of the static deployment table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub address: Address,
    pub chain_id: u64,
}

/// Static table of vault deployments keyed by network identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deployments(BTreeMap<u64, Deployment>);

impl Deployments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployment for a network.
    pub fn insert(&mut self, chain_id: u64, address: Address) {
        self.0.insert(chain_id, Deployment { address, chain_id });
    }

    pub fn get(&self, chain_id: u64) -> Option<&Deployment> {
        self.0.get(&chain_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve the binding for the active network.
    ///
    /// A network without an entry resolves to a binding with no address.
    pub fn resolve(&self, chain_id: Option<u64>) -> ContractBinding {
        match chain_id {
            None => ContractBinding::default(),
            Some(id) => match self.0.get(&id) {
                Some(entry) => ContractBinding {
                    address: Some(entry.address),
                    chain_id: Some(entry.chain_id),
                },
                None => ContractBinding {
                    address: None,
                    chain_id: Some(id),
                },
            },
        }
    }
}

/// Contract binding derived from the active network. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContractBinding {
    /// `None` when the active network has no deployment
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
}

/// Network identity reported by a ledger endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: u64,
    pub vault_address: Address,
    pub block_number: u64,
    pub timestamp: u64,
}

// =========================
// LEDGER CALLS
// =========================

/// State-changing calls accepted by the vault contract.
///
/// Bids carry only a handle and its validity proof; there is no field for a
/// clear bid value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum VaultCall {
    #[serde(rename_all = "camelCase")]
    CreateAuction {
        title: String,
        description: String,
        starting_bid: U256,
        duration_hours: U256,
    },

    #[serde(rename_all = "camelCase")]
    PlaceBid {
        auction_id: U256,
        handle: Handle,
        input_proof: Bytes,
    },
}

impl VaultCall {
    /// Contract function name.
    pub fn name(&self) -> &'static str {
        match self {
            VaultCall::CreateAuction { .. } => "createAuction",
            VaultCall::PlaceBid { .. } => "placeBid",
        }
    }
}

/// Inclusion receipt for a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// `false` when the call reverted
    pub status: bool,
    pub revert_reason: Option<String>,
}
