//! Mock chain server for local testing of the confidential bidding vault.
//!
//! This provides a JSON-RPC server that hosts one vault contract and the
//! coprocessor relayer on a simulated chain, without a real blockchain.
//! Every transaction is mined into its own block immediately.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, U256};
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use cipherbid_crypto::Coprocessor;
use cipherbid_module::LocalChain;
use cipherbid_types::{
    AuctionTuple, ChainInfo, ClearValue, EncryptedInput, Handle, SealedInput, TxHash, TxReceipt,
    UserDecryptRequest, VaultCall,
};

/// Chain id used when none is configured.
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Deterministic vault address for a chain.
pub fn vault_address_for(chain_id: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"cipherbid:vault");
    hasher.update(chain_id.to_be_bytes());
    Address::from_slice(&hasher.finalize()[12..])
}

fn wall_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Shared chain state.
struct ChainState {
    chain: LocalChain,
    /// Seconds added to the wall clock by `admin_advanceTime`
    time_offset: u64,
}

impl ChainState {
    fn now(&self) -> u64 {
        wall_clock().saturating_add(self.time_offset)
    }

    fn sync_clock(&mut self) {
        let now = self.now();
        self.chain.set_timestamp(now);
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Chain Methods ============

    /// Chain id, vault address and head block.
    #[method(name = "chain_info")]
    async fn chain_info(&self) -> Result<ChainInfo, ErrorObjectOwned>;

    /// Advance chain time (for testing expiry).
    #[method(name = "admin_advanceTime")]
    async fn admin_advance_time(&self, seconds: u64) -> Result<ChainInfo, ErrorObjectOwned>;

    // ============ Vault Methods ============

    #[method(name = "vault_getAuctionCount")]
    async fn vault_get_auction_count(&self, contract: Address) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "vault_getAuction")]
    async fn vault_get_auction(
        &self,
        contract: Address,
        auction_id: U256,
    ) -> Result<AuctionTuple, ErrorObjectOwned>;

    /// Sealed bid handle of `account`; the zero word when absent.
    #[method(name = "vault_getBid")]
    async fn vault_get_bid(
        &self,
        contract: Address,
        auction_id: U256,
        account: Address,
    ) -> Result<Handle, ErrorObjectOwned>;

    /// Execute a call and mine it. Reverts still yield a receipt.
    #[method(name = "vault_sendTransaction")]
    async fn vault_send_transaction(
        &self,
        from: Address,
        contract: Address,
        call: VaultCall,
    ) -> Result<TxHash, ErrorObjectOwned>;

    #[method(name = "vault_getTransactionReceipt")]
    async fn vault_get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TxReceipt>, ErrorObjectOwned>;

    // ============ Relayer Methods ============

    /// Seal an encrypted input.
    #[method(name = "relayer_encrypt")]
    async fn relayer_encrypt(&self, input: EncryptedInput)
        -> Result<SealedInput, ErrorObjectOwned>;

    /// Reveal handles under a signed authorization.
    #[method(name = "relayer_userDecrypt")]
    async fn relayer_user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<Vec<(Handle, ClearValue)>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
pub struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    pub fn new(chain_id: u64) -> Self {
        let chain = LocalChain::new(
            chain_id,
            vault_address_for(chain_id),
            Coprocessor::new(&mut OsRng),
        );
        let mut state = ChainState {
            chain,
            time_offset: 0,
        };
        state.sync_clock();
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    fn rpc_error(msg: impl ToString) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn head(state: &ChainState) -> ChainInfo {
        ChainInfo {
            timestamp: state.now(),
            ..state.chain.info()
        }
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn chain_info(&self) -> Result<ChainInfo, ErrorObjectOwned> {
        Ok(Self::head(&self.state.read()))
    }

    async fn admin_advance_time(&self, seconds: u64) -> Result<ChainInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.time_offset = state.time_offset.saturating_add(seconds);
        state.sync_clock();
        info!(seconds, timestamp = state.chain.timestamp(), "Time advanced");
        Ok(Self::head(&state))
    }

    async fn vault_get_auction_count(&self, contract: Address) -> Result<U256, ErrorObjectOwned> {
        self.state
            .read()
            .chain
            .auction_count(contract)
            .map_err(Self::rpc_error)
    }

    async fn vault_get_auction(
        &self,
        contract: Address,
        auction_id: U256,
    ) -> Result<AuctionTuple, ErrorObjectOwned> {
        self.state
            .read()
            .chain
            .auction(contract, auction_id)
            .map_err(Self::rpc_error)
    }

    async fn vault_get_bid(
        &self,
        contract: Address,
        auction_id: U256,
        account: Address,
    ) -> Result<Handle, ErrorObjectOwned> {
        self.state
            .read()
            .chain
            .bid(contract, auction_id, account)
            .map_err(Self::rpc_error)
    }

    async fn vault_send_transaction(
        &self,
        from: Address,
        contract: Address,
        call: VaultCall,
    ) -> Result<TxHash, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.sync_clock();
        let receipt = state.chain.execute(from, contract, &call);
        Ok(receipt.tx_hash)
    }

    async fn vault_get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TxReceipt>, ErrorObjectOwned> {
        Ok(self.state.read().chain.receipt(&tx_hash).cloned())
    }

    async fn relayer_encrypt(
        &self,
        input: EncryptedInput,
    ) -> Result<SealedInput, ErrorObjectOwned> {
        let mut state = self.state.write();
        let sealed = state
            .chain
            .coprocessor_mut()
            .encrypt(&input)
            .map_err(Self::rpc_error)?;
        debug!(handles = sealed.handles.len(), "Sealed input");
        Ok(sealed)
    }

    async fn relayer_user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<Vec<(Handle, ClearValue)>, ErrorObjectOwned> {
        let state = self.state.read();
        let now = state.now();
        state
            .chain
            .coprocessor()
            .user_decrypt(&request, now)
            .map_err(Self::rpc_error)
    }
}

/// Start a server on `addr`. Returns the bound address and the server handle.
pub async fn spawn(addr: SocketAddr, chain_id: u64) -> anyhow::Result<(SocketAddr, ServerHandle)> {
    let server = Server::builder().build(addr).await?;
    let local_addr = server.local_addr()?;
    let handle = server.start(MockChainServer::new(chain_id).into_rpc());
    info!(
        addr = %local_addr,
        chain_id,
        vault = %vault_address_for(chain_id),
        "Mock chain server started"
    );
    Ok((local_addr, handle))
}
