//! Vault contract revert reasons.

use alloy_primitives::{Address, U256};
use thiserror::Error;

use cipherbid_crypto::CoprocessorError;

/// Errors that revert a vault call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(U256),

    #[error("Auction {0} has ended")]
    AuctionEnded(U256),

    #[error("Starting bid must be positive")]
    InvalidStartingBid,

    #[error("Duration must be at least one hour")]
    InvalidDuration,

    #[error("Call sent to {got}, vault is at {expected}")]
    WrongContract { expected: Address, got: Address },

    #[error("Invalid encrypted input: {0}")]
    InvalidInput(#[from] CoprocessorError),
}
