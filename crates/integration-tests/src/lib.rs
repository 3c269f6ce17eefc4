//! End-to-end integration tests for the confidential bidding vault.
//!
//! These tests drive a client [`Session`] against a real vault and
//! coprocessor, either in-process or through the mock chain's JSON-RPC
//! server:
//! 1. Auction creation and listing
//! 2. Bid sealing and submission
//! 3. Decryption under a cached authorization
//! 4. Authorization expiry and regeneration

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::OsRng;

use cipherbid_client::{
    Clock, ClientConfig, ClientError, ClientResult, ConfidentialService, LocalWallet, ManualClock,
    SignError, VaultLedger, WalletSigner,
};
use cipherbid_crypto::{generate_ephemeral_keypair, Coprocessor};
use cipherbid_module::LocalChain;
use cipherbid_types::{
    AuctionTuple, AuthorizationMessage, ClearValue, EncryptedInput, EphemeralKeyPair, Handle,
    SealedInput, TxHash, TxReceipt, UserDecryptRequest, VaultCall,
};

/// A vault chain and its coprocessor in this process, timed by a shared clock.
pub struct InProcessChain {
    chain: Mutex<LocalChain>,
    clock: Arc<ManualClock>,
}

impl InProcessChain {
    pub fn new(chain_id: u64, vault_address: Address, clock: Arc<ManualClock>) -> Self {
        let mut chain = LocalChain::new(chain_id, vault_address, Coprocessor::new(&mut OsRng));
        chain.set_timestamp(clock.now());
        Self {
            chain: Mutex::new(chain),
            clock,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain.lock().info().chain_id
    }

    pub fn vault_address(&self) -> Address {
        self.chain.lock().vault_address()
    }

    /// Client config with this chain's deployment.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config
            .deployments
            .insert(self.chain_id(), self.vault_address());
        config
    }
}

fn transport(e: impl std::fmt::Display) -> ClientError {
    ClientError::Transport(e.to_string())
}

#[async_trait]
impl VaultLedger for InProcessChain {
    async fn auction_count(&self, contract: Address) -> ClientResult<U256> {
        self.chain.lock().auction_count(contract).map_err(transport)
    }

    async fn auction(&self, contract: Address, auction_id: U256) -> ClientResult<AuctionTuple> {
        self.chain
            .lock()
            .auction(contract, auction_id)
            .map_err(transport)
    }

    async fn bid_handle(
        &self,
        contract: Address,
        auction_id: U256,
        account: Address,
    ) -> ClientResult<Handle> {
        self.chain
            .lock()
            .bid(contract, auction_id, account)
            .map_err(transport)
    }

    async fn send_transaction(
        &self,
        from: Address,
        contract: Address,
        call: VaultCall,
    ) -> ClientResult<TxHash> {
        let mut chain = self.chain.lock();
        chain.set_timestamp(self.clock.now());
        Ok(chain.execute(from, contract, &call).tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> ClientResult<TxReceipt> {
        self.chain
            .lock()
            .receipt(&tx_hash)
            .cloned()
            .ok_or_else(|| ClientError::Transport(format!("unknown transaction {tx_hash}")))
    }
}

#[async_trait]
impl ConfidentialService for InProcessChain {
    async fn encrypt(&self, input: EncryptedInput) -> ClientResult<SealedInput> {
        self.chain
            .lock()
            .coprocessor_mut()
            .encrypt(&input)
            .map_err(transport)
    }

    fn generate_keypair(&self) -> EphemeralKeyPair {
        generate_ephemeral_keypair(&mut OsRng)
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> ClientResult<HashMap<Handle, ClearValue>> {
        let values = self
            .chain
            .lock()
            .coprocessor()
            .user_decrypt(&request, self.clock.now())
            .map_err(|e| ClientError::Decryption(e.to_string()))?;
        Ok(values.into_iter().collect())
    }
}

/// Wallet wrapper that counts signature prompts.
pub struct CountingSigner {
    inner: LocalWallet,
    prompts: AtomicUsize,
}

impl CountingSigner {
    pub fn new(inner: LocalWallet) -> Self {
        Self {
            inner,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn random() -> Self {
        Self::new(LocalWallet::random())
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for CountingSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_authorization(&self, message: &AuthorizationMessage) -> Result<Bytes, SignError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_authorization(message).await
    }
}
