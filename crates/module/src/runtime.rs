//! Single-node chain runtime hosting one vault.
//!
//! Every executed call is mined into its own block and leaves a receipt.
//! Reverted calls produce a receipt with `status = false` and leave state
//! untouched.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use cipherbid_crypto::Coprocessor;
use cipherbid_types::{AuctionTuple, ChainInfo, Handle, TxHash, TxReceipt, VaultCall};

use crate::error::VaultError;
use crate::handlers::{handle_call, CallContext, HandlerResult};
use crate::queries;
use crate::state::VaultState;

/// Local chain state.
#[derive(Debug)]
pub struct LocalChain {
    chain_id: u64,
    vault_address: Address,
    vault: VaultState,
    coprocessor: Coprocessor,
    receipts: HashMap<TxHash, TxReceipt>,
    block_number: u64,
    timestamp: u64,
    tx_count: u64,
}

impl LocalChain {
    pub fn new(chain_id: u64, vault_address: Address, coprocessor: Coprocessor) -> Self {
        Self {
            chain_id,
            vault_address,
            vault: VaultState::new(),
            coprocessor,
            receipts: HashMap::new(),
            block_number: 0,
            timestamp: 0,
            tx_count: 0,
        }
    }

    pub fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: self.chain_id,
            vault_address: self.vault_address,
            block_number: self.block_number,
            timestamp: self.timestamp,
        }
    }

    pub fn vault_address(&self) -> Address {
        self.vault_address
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    pub fn vault(&self) -> &VaultState {
        &self.vault
    }

    pub fn coprocessor(&self) -> &Coprocessor {
        &self.coprocessor
    }

    pub fn coprocessor_mut(&mut self) -> &mut Coprocessor {
        &mut self.coprocessor
    }

    /// Execute a call from `from` against `contract` and mine it.
    pub fn execute(&mut self, from: Address, contract: Address, call: &VaultCall) -> TxReceipt {
        self.tx_count += 1;
        self.block_number += 1;
        let tx_hash = self.tx_hash(from);

        let result = self.check_contract(contract).and_then(|()| {
            let ctx = CallContext {
                sender: from,
                contract,
                timestamp: self.timestamp,
            };
            handle_call(&mut self.vault, &mut self.coprocessor, &ctx, call)
        });

        let receipt = match result {
            Ok(()) => {
                info!(
                    tx = %tx_hash,
                    block = self.block_number,
                    method = call.name(),
                    "Transaction included"
                );
                TxReceipt {
                    tx_hash,
                    block_number: self.block_number,
                    status: true,
                    revert_reason: None,
                }
            }
            Err(e) => {
                warn!(tx = %tx_hash, method = call.name(), error = %e, "Transaction reverted");
                TxReceipt {
                    tx_hash,
                    block_number: self.block_number,
                    status: false,
                    revert_reason: Some(e.to_string()),
                }
            }
        };

        self.receipts.insert(tx_hash, receipt.clone());
        receipt
    }

    pub fn receipt(&self, tx_hash: &TxHash) -> Option<&TxReceipt> {
        self.receipts.get(tx_hash)
    }

    pub fn auction_count(&self, contract: Address) -> HandlerResult<U256> {
        self.check_contract(contract)?;
        Ok(queries::auction_count(&self.vault))
    }

    pub fn auction(&self, contract: Address, auction_id: U256) -> HandlerResult<AuctionTuple> {
        self.check_contract(contract)?;
        queries::auction(&self.vault, auction_id)
    }

    pub fn bid(&self, contract: Address, auction_id: U256, account: Address) -> HandlerResult<Handle> {
        self.check_contract(contract)?;
        Ok(queries::bid(&self.vault, auction_id, account))
    }

    fn check_contract(&self, contract: Address) -> HandlerResult<()> {
        if contract != self.vault_address {
            return Err(VaultError::WrongContract {
                expected: self.vault_address,
                got: contract,
            });
        }
        Ok(())
    }

    fn tx_hash(&self, from: Address) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.to_be_bytes());
        hasher.update(from.as_slice());
        hasher.update(self.tx_count.to_be_bytes());
        hasher.update(self.block_number.to_be_bytes());
        B256::from_slice(&hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn chain() -> LocalChain {
        LocalChain::new(31337, Address::repeat_byte(0xc0), Coprocessor::new(&mut OsRng))
    }

    fn create_call() -> VaultCall {
        VaultCall::CreateAuction {
            title: "A".to_string(),
            description: "d".to_string(),
            starting_bid: U256::from(10u64),
            duration_hours: U256::from(24u64),
        }
    }

    #[test]
    fn test_execute_mines_receipt() {
        let mut chain = chain();
        let vault = chain.vault_address();

        let receipt = chain.execute(Address::repeat_byte(1), vault, &create_call());

        assert!(receipt.status);
        assert_eq!(receipt.block_number, 1);
        assert_eq!(chain.receipt(&receipt.tx_hash), Some(&receipt));
        assert_eq!(chain.auction_count(vault).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_wrong_contract_reverts() {
        let mut chain = chain();

        let receipt = chain.execute(Address::repeat_byte(1), Address::repeat_byte(9), &create_call());

        assert!(!receipt.status);
        assert!(receipt.revert_reason.is_some());
        assert_eq!(chain.vault().auctions.len(), 0);
        assert!(chain.auction_count(Address::repeat_byte(9)).is_err());
    }
}
