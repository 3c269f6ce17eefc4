//! Client for the confidential bidding vault.
//!
//! A [`Session`] keeps a read model of one vault contract and runs the user
//! operations against it:
//! - Listing auctions, guarded against network switches mid-refresh
//! - Creating auctions
//! - Sealing bids with the coprocessor and submitting only handles and proofs
//! - Decrypting the caller's own bid under a cached, signed authorization
//!
//! The ledger, coprocessor, wallet, store and clock are traits so callers can
//! plug in a JSON-RPC endpoint ([`rpc`]), an in-process chain, or test doubles.

pub mod auth;
pub mod bid;
pub mod clock;
pub mod config;
pub mod decrypt;
pub mod error;
pub mod ledger;
pub mod rpc;
pub mod service;
pub mod session;
pub mod storage;
pub mod sync;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::DecryptionAuthorizationCache;
pub use bid::{CreateAuctionRequest, PlaceBidRequest, WriteContext};
pub use clock::{Clock, LedgerClock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use decrypt::DecryptContext;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use ledger::VaultLedger;
pub use service::ConfidentialService;
pub use session::{Session, SessionSnapshot};
pub use storage::{FileStorage, MemoryStorage, StorageError, StringStorage};
pub use sync::fetch_auctions;
pub use wallet::{LocalWallet, SignError, WalletSigner};
