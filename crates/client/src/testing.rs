//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use cipherbid_types::{
    AuctionTuple, AuthorizationMessage, ClearValue, EncryptedInput, EphemeralKeyPair, Handle,
    SealedInput, TxHash, TxReceipt, TypedPlaintext, UserDecryptRequest, VaultCall,
};

use crate::error::{ClientError, ClientResult};
use crate::ledger::VaultLedger;
use crate::service::ConfidentialService;
use crate::wallet::{SignError, WalletSigner};

/// Pauses the next `auction_count` call until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeLedger {
    auctions: Mutex<HashMap<Address, Vec<AuctionTuple>>>,
    bids: Mutex<HashMap<(Address, U256, Address), Handle>>,
    sent: Mutex<Vec<(Address, Address, VaultCall)>>,
    failing: Mutex<HashSet<Address>>,
    gate: Mutex<Option<Arc<Gate>>>,
    count_calls: AtomicUsize,
    revert: AtomicBool,
}

fn word(n: usize) -> B256 {
    B256::from(U256::from(n).to_be_bytes::<32>())
}

pub fn auction_tuple(id: u64, creator: Address) -> AuctionTuple {
    (
        U256::from(id),
        format!("Auction {id}"),
        "fake".to_string(),
        creator,
        U256::from(100),
        B256::ZERO,
        Address::ZERO,
        U256::from(2_000_000_000u64),
        false,
        false,
    )
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_auctions(&self, contract: Address, count: usize) {
        let items = (1..=count as u64)
            .map(|id| auction_tuple(id, Address::repeat_byte(0x11)))
            .collect();
        self.auctions.lock().insert(contract, items);
    }

    pub fn set_bid(&self, contract: Address, auction_id: U256, account: Address, handle: Handle) {
        self.bids.lock().insert((contract, auction_id, account), handle);
    }

    pub fn fail_reads(&self, contract: Address) {
        self.failing.lock().insert(contract);
    }

    pub fn heal(&self, contract: Address) {
        self.failing.lock().remove(&contract);
    }

    pub fn set_revert(&self, revert: bool) {
        self.revert.store(revert, Ordering::SeqCst);
    }

    pub fn arm_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(Address, Address, VaultCall)> {
        self.sent.lock().clone()
    }

    fn check(&self, contract: Address) -> ClientResult<()> {
        if self.failing.lock().contains(&contract) {
            return Err(ClientError::Transport(format!("{contract} unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl VaultLedger for FakeLedger {
    async fn auction_count(&self, contract: Address) -> ClientResult<U256> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.check(contract)?;
        let count = self.auctions.lock().get(&contract).map_or(0, Vec::len);
        Ok(U256::from(count))
    }

    async fn auction(&self, contract: Address, auction_id: U256) -> ClientResult<AuctionTuple> {
        self.check(contract)?;
        let index = usize::try_from(auction_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .ok_or_else(|| ClientError::Transport("bad id".to_string()))?;
        self.auctions
            .lock()
            .get(&contract)
            .and_then(|items| items.get(index).cloned())
            .ok_or_else(|| ClientError::Transport(format!("auction {auction_id} not found")))
    }

    async fn bid_handle(
        &self,
        contract: Address,
        auction_id: U256,
        account: Address,
    ) -> ClientResult<Handle> {
        self.check(contract)?;
        Ok(self
            .bids
            .lock()
            .get(&(contract, auction_id, account))
            .copied()
            .unwrap_or(B256::ZERO))
    }

    async fn send_transaction(
        &self,
        from: Address,
        contract: Address,
        call: VaultCall,
    ) -> ClientResult<TxHash> {
        self.check(contract)?;
        let mut sent = self.sent.lock();
        match &call {
            VaultCall::CreateAuction { .. } => {
                let mut auctions = self.auctions.lock();
                let items = auctions.entry(contract).or_default();
                let id = items.len() as u64 + 1;
                items.push(auction_tuple(id, from));
            }
            VaultCall::PlaceBid {
                auction_id, handle, ..
            } => {
                self.bids.lock().insert((contract, *auction_id, from), *handle);
            }
        }
        sent.push((from, contract, call));
        Ok(word(sent.len()))
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> ClientResult<TxReceipt> {
        let status = !self.revert.load(Ordering::SeqCst);
        Ok(TxReceipt {
            tx_hash,
            block_number: 1,
            status,
            revert_reason: (!status).then(|| "fake revert".to_string()),
        })
    }
}

/// Coprocessor fake. Handles map straight back to their plaintexts.
#[derive(Default)]
pub struct FakeService {
    encrypted: Mutex<Vec<EncryptedInput>>,
    values: Mutex<HashMap<Handle, ClearValue>>,
    decrypt_calls: AtomicUsize,
    keypairs: AtomicUsize,
    empty_results: AtomicBool,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encrypted(&self) -> Vec<EncryptedInput> {
        self.encrypted.lock().clone()
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    pub fn set_value(&self, handle: Handle, value: ClearValue) {
        self.values.lock().insert(handle, value);
    }

    pub fn set_empty_results(&self, empty: bool) {
        self.empty_results.store(empty, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfidentialService for FakeService {
    async fn encrypt(&self, input: EncryptedInput) -> ClientResult<SealedInput> {
        let mut encrypted = self.encrypted.lock();
        let mut values = self.values.lock();
        let mut handles = Vec::new();
        for (index, value) in input.values().iter().enumerate() {
            let handle = word(0xbeef_0000 + encrypted.len() * 16 + index);
            let clear = match value {
                TypedPlaintext::Uint64(amount) => ClearValue::Uint(U256::from(*amount)),
                other => ClearValue::Numeric(format!("{other:?}")),
            };
            values.insert(handle, clear);
            handles.push(handle);
        }
        encrypted.push(input);
        Ok(SealedInput {
            handles,
            input_proof: Bytes::from(format!("proof-{}", encrypted.len()).into_bytes()),
        })
    }

    fn generate_keypair(&self) -> EphemeralKeyPair {
        let n = self.keypairs.fetch_add(1, Ordering::SeqCst) as u8;
        EphemeralKeyPair {
            public_key: Bytes::from(vec![n; 32]),
            private_key: Bytes::from(vec![n ^ 0xff; 32]),
        }
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> ClientResult<HashMap<Handle, ClearValue>> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.empty_results.load(Ordering::SeqCst) {
            return Ok(HashMap::new());
        }
        let values = self.values.lock();
        Ok(request
            .handles
            .iter()
            .filter_map(|pair| {
                values
                    .get(&pair.handle)
                    .map(|value| (pair.handle, value.clone()))
            })
            .collect())
    }
}

pub struct FakeSigner {
    address: Address,
    sign_calls: AtomicUsize,
    reject: AtomicBool,
}

impl FakeSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            sign_calls: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
        }
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletSigner for FakeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_authorization(&self, message: &AuthorizationMessage) -> Result<Bytes, SignError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(SignError::Rejected);
        }
        Ok(Bytes::from(message.signing_bytes()))
    }
}
