//! In-memory confidential bidding vault.
//!
//! This module implements the contract surface the client talks to:
//!
//! - `getAuctionCount` / `getAuction(id)` with the fixed ten-field tuple
//! - `createAuction(title, description, startingBid, durationHours)`
//! - `placeBid(auctionId, handle, inputProof)` storing only the handle
//! - `getBid(auctionId, account)` returning the zero word when absent
//!
//! # Architecture
//!
//! - `state`: contract storage
//! - `handlers`: state-changing calls
//! - `queries`: read-only views
//! - `runtime`: a single-node chain executing calls into receipts
//! - `error`: revert reasons
//!
//! # Example
//!
//! ```ignore
//! use cipherbid_module::{runtime::LocalChain, CallContext};
//!
//! let mut chain = LocalChain::new(vault_address, 31337, coprocessor);
//! let receipt = chain.execute(sender, vault_address, call);
//! let count = chain.vault().auction_count();
//! ```

pub mod error;
pub mod handlers;
pub mod queries;
pub mod runtime;
pub mod state;

pub use error::VaultError;
pub use handlers::{CallContext, HandlerResult};
pub use runtime::LocalChain;
pub use state::{AuctionRecord, VaultState};
