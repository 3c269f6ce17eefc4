//! Local confidential-computation engine for the bidding vault.
//!
//! This crate stands in for the external coprocessor in local deployments
//! and tests. It provides:
//!
//! 1. **Input sealing**: typed plaintexts bound to `(contract, user)` are
//!    stored under opaque handles; one proof covers all handles of an input.
//! 2. **Access control**: the contract grants accounts the right to reveal
//!    specific handles.
//! 3. **User decryption**: a handle is revealed only to its allowed account,
//!    under a wallet-signed, time-boxed authorization naming the contract.
//!
//! Wallet keys are Ed25519; an account address is the low 20 bytes of the
//! SHA-256 of the verifying key, and wallet signatures carry the verifying
//! key so the signer can be checked against the claimed address.

pub mod coprocessor;
pub mod error;
pub mod keys;

pub use coprocessor::Coprocessor;
pub use error::CoprocessorError;
pub use keys::{
    address_of, generate_ephemeral_keypair, keypair_matches, verify_wallet_signature, WalletKey,
    WALLET_SIGNATURE_LEN,
};
