//! Client error types.

use alloy_primitives::U256;
use cipherbid_types::TxHash;
use thiserror::Error;

/// Failure classes a caller may branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Preconditions unmet: missing signer, coprocessor, ledger or address
    NotReady,
    /// Malformed or non-positive numeric input, rejected before submission
    InvalidInput,
    /// Legitimate absence of data; do not retry
    NotFound,
    /// The user declined or failed to sign; retrying the flow may succeed
    AuthorizationDenied,
    /// RPC, revert or decryption failure
    Transport,
}

/// Errors surfaced by client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Wallet or coprocessor not ready: missing {0}")]
    NotReady(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("No bid found for auction {0}")]
    BidNotFound(U256),

    #[error("Unable to authorize decryption")]
    AuthorizationDenied,

    #[error("Ledger request failed: {0}")]
    Transport(String),

    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: TxHash, reason: String },

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Decryption failed: empty result")]
    EmptyResult,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotReady(_) => ErrorKind::NotReady,
            ClientError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ClientError::BidNotFound(_) => ErrorKind::NotFound,
            ClientError::AuthorizationDenied => ErrorKind::AuthorizationDenied,
            ClientError::Transport(_)
            | ClientError::Reverted { .. }
            | ClientError::Decryption(_)
            | ClientError::EmptyResult => ErrorKind::Transport,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ClientError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
