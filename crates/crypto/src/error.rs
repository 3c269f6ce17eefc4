//! Error types for coprocessor operations.

use alloy_primitives::Address;
use cipherbid_types::Handle;
use thiserror::Error;

/// Errors that can occur while sealing inputs or revealing ciphertexts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoprocessorError {
    #[error("Encrypted input has no values")]
    EmptyInput,

    #[error("Encrypted input too large: {bits} bits, max {max}")]
    InputTooLarge { bits: u32, max: u32 },

    #[error("Malformed input proof")]
    MalformedProof,

    #[error("Input proof verification failed")]
    InvalidProof,

    #[error("Unknown handle {0}")]
    UnknownHandle(Handle),

    #[error("Account {account} is not allowed to decrypt {handle}")]
    NotAllowed { handle: Handle, account: Address },

    #[error("Contract {0} is not covered by the authorization")]
    ContractNotAuthorized(Address),

    #[error("Decryption authorization expired or not yet valid")]
    AuthorizationExpired,

    #[error("Private key does not match public key")]
    KeyPairMismatch,

    #[error("Invalid wallet signature")]
    InvalidSignature,

    #[error("Signature is from {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("Decrypt request has no handles")]
    EmptyRequest,
}
