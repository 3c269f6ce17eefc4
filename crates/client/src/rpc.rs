//! JSON-RPC adapters for the ledger and coprocessor endpoints.

use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::HttpClientBuilder;
use jsonrpsee::rpc_params;
use rand::rngs::OsRng;
use tracing::debug;

use cipherbid_types::{
    AuctionTuple, ChainInfo, ClearValue, EncryptedInput, EphemeralKeyPair, Handle, SealedInput,
    TxHash, TxReceipt, UserDecryptRequest, VaultCall,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::ledger::VaultLedger;
use crate::service::ConfidentialService;

pub use jsonrpsee::http_client::HttpClient;

fn transport(e: impl std::fmt::Display) -> ClientError {
    ClientError::Transport(e.to_string())
}

/// Build an HTTP client for `url`.
pub fn connect(url: &str) -> ClientResult<HttpClient> {
    HttpClientBuilder::default().build(url).map_err(transport)
}

pub async fn chain_info(client: &HttpClient) -> ClientResult<ChainInfo> {
    client
        .request("chain_info", rpc_params![])
        .await
        .map_err(transport)
}

/// Move the node's clock forward. Only served by development nodes.
pub async fn advance_time(client: &HttpClient, seconds: u64) -> ClientResult<ChainInfo> {
    client
        .request("admin_advanceTime", rpc_params![seconds])
        .await
        .map_err(transport)
}

/// Vault ledger over JSON-RPC. Inclusion is detected by polling receipts.
#[derive(Clone)]
pub struct RpcLedger {
    client: HttpClient,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl RpcLedger {
    pub fn new(client: HttpClient, config: &ClientConfig) -> Self {
        Self {
            client,
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            poll_attempts: config.receipt_poll_attempts.max(1),
        }
    }
}

#[async_trait]
impl VaultLedger for RpcLedger {
    async fn auction_count(&self, contract: Address) -> ClientResult<U256> {
        self.client
            .request("vault_getAuctionCount", rpc_params![contract])
            .await
            .map_err(transport)
    }

    async fn auction(&self, contract: Address, auction_id: U256) -> ClientResult<AuctionTuple> {
        self.client
            .request("vault_getAuction", rpc_params![contract, auction_id])
            .await
            .map_err(transport)
    }

    async fn bid_handle(
        &self,
        contract: Address,
        auction_id: U256,
        account: Address,
    ) -> ClientResult<Handle> {
        self.client
            .request("vault_getBid", rpc_params![contract, auction_id, account])
            .await
            .map_err(transport)
    }

    async fn send_transaction(
        &self,
        from: Address,
        contract: Address,
        call: VaultCall,
    ) -> ClientResult<TxHash> {
        self.client
            .request("vault_sendTransaction", rpc_params![from, contract, call])
            .await
            .map_err(transport)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> ClientResult<TxReceipt> {
        for attempt in 1..=self.poll_attempts {
            let receipt: Option<TxReceipt> = self
                .client
                .request("vault_getTransactionReceipt", rpc_params![tx_hash])
                .await
                .map_err(transport)?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            debug!(tx_hash = %tx_hash, attempt, "Receipt not yet available");
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(ClientError::Transport(format!(
            "transaction {tx_hash} not included after {} polls",
            self.poll_attempts
        )))
    }
}

/// Coprocessor relayer over JSON-RPC.
///
/// Ephemeral key pairs are generated locally so the private key only leaves
/// the client inside a signed decrypt request.
#[derive(Clone)]
pub struct RpcCoprocessor {
    client: HttpClient,
}

impl RpcCoprocessor {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfidentialService for RpcCoprocessor {
    async fn encrypt(&self, input: EncryptedInput) -> ClientResult<SealedInput> {
        self.client
            .request("relayer_encrypt", rpc_params![input])
            .await
            .map_err(transport)
    }

    fn generate_keypair(&self) -> EphemeralKeyPair {
        cipherbid_crypto::generate_ephemeral_keypair(&mut OsRng)
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> ClientResult<HashMap<Handle, ClearValue>> {
        let values: Vec<(Handle, ClearValue)> = self
            .client
            .request("relayer_userDecrypt", rpc_params![request])
            .await
            .map_err(|e| ClientError::Decryption(e.to_string()))?;
        Ok(values.into_iter().collect())
    }
}
