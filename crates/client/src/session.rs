//! Session orchestration.
//!
//! A [`Session`] binds one active vault contract and exposes the read model
//! (auctions, loading, error, status message, pending flag) together with the
//! four user operations. Refresh results are committed only while the contract
//! they were fetched for is still the active one.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use cipherbid_types::{AuctionView, ContractBinding, Deployments, TxReceipt};

use crate::auth::DecryptionAuthorizationCache;
use crate::bid::{
    CreateAuctionRequest, PlaceBidRequest, WriteContext, STATUS_AUCTION_CREATED,
    STATUS_CREATING_AUCTION,
};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::decrypt::DecryptContext;
use crate::error::{ClientError, ClientResult};
use crate::ledger::VaultLedger;
use crate::service::ConfidentialService;
use crate::storage::{MemoryStorage, StringStorage};
use crate::sync::fetch_auctions;
use crate::wallet::WalletSigner;

/// Read model observed by a UI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub contract_address: Option<Address>,
    /// `None` while unknown, which is distinct from an empty list
    pub auctions: Option<Vec<AuctionView>>,
    pub loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
    pub tx_pending: bool,
    pub can_use_read: bool,
    pub can_use_write: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    auctions: Option<Vec<AuctionView>>,
    /// Contract the current list was loaded from
    auctions_contract: Option<Address>,
    loading: bool,
    error: Option<String>,
    message: Option<String>,
    tx_pending: bool,
}

pub struct Session {
    config: ClientConfig,
    ledger: Option<Arc<dyn VaultLedger>>,
    service: Option<Arc<dyn ConfidentialService>>,
    signer: RwLock<Option<Arc<dyn WalletSigner>>>,
    storage: Arc<dyn StringStorage>,
    clock: Arc<dyn Clock>,
    cache: DecryptionAuthorizationCache,
    binding: RwLock<ContractBinding>,
    state: Mutex<SessionState>,
}

/// Holds the pending flag for the duration of a write.
struct PendingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl<'a> PendingGuard<'a> {
    fn enter(state: &'a Mutex<SessionState>) -> Self {
        state.lock().tx_pending = true;
        Self { state }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().tx_pending = false;
    }
}

/// Holds the loading flag for one refresh of `contract`.
struct LoadingGuard<'a> {
    session: &'a Session,
    contract: Address,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        // A newer binding owns the flag now
        if self.session.is_current(self.contract) {
            self.session.state.lock().loading = false;
        }
    }
}

impl Session {
    pub fn new(config: ClientConfig) -> Self {
        let storage: Arc<dyn StringStorage> = Arc::new(MemoryStorage::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = build_cache(&config, storage.clone(), clock.clone());
        Self {
            config,
            ledger: None,
            service: None,
            signer: RwLock::new(None),
            storage,
            clock,
            cache,
            binding: RwLock::new(ContractBinding::default()),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn VaultLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_service(mut self, service: Arc<dyn ConfidentialService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_signer(self, signer: Arc<dyn WalletSigner>) -> Self {
        *self.signer.write() = Some(signer);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StringStorage>) -> Self {
        self.storage = storage;
        self.cache = build_cache(&self.config, self.storage.clone(), self.clock.clone());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.cache = build_cache(&self.config, self.storage.clone(), self.clock.clone());
        self
    }

    /// Resolve the initial binding without refreshing.
    pub fn with_chain_id(self, chain_id: Option<u64>) -> Self {
        *self.binding.write() = self.deployments().resolve(chain_id);
        self
    }

    pub fn deployments(&self) -> &Deployments {
        &self.config.deployments
    }

    pub fn binding(&self) -> ContractBinding {
        *self.binding.read()
    }

    pub fn contract_address(&self) -> Option<Address> {
        self.binding.read().address
    }

    pub fn cache(&self) -> &DecryptionAuthorizationCache {
        &self.cache
    }

    pub fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer.read().clone()
    }

    /// Reads need a bound contract and a ledger.
    pub fn can_use_read(&self) -> bool {
        self.contract_address().is_some() && self.ledger.is_some()
    }

    /// Writes additionally need a signer and the coprocessor.
    pub fn can_use_write(&self) -> bool {
        self.can_use_read() && self.service.is_some() && self.signer.read().is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let contract_address = self.contract_address();
        let can_use_read = self.can_use_read();
        let can_use_write = self.can_use_write();
        let state = self.state.lock();
        SessionSnapshot {
            contract_address,
            auctions: state.auctions.clone(),
            loading: state.loading,
            error: state.error.clone(),
            message: state.message.clone(),
            tx_pending: state.tx_pending,
            can_use_read,
            can_use_write,
        }
    }

    /// Initial load.
    pub async fn mount(&self) {
        self.refresh().await;
    }

    /// Replace or remove the connected wallet.
    pub fn connect_signer(&self, signer: Option<Arc<dyn WalletSigner>>) {
        let address = signer.as_ref().map(|s| s.address());
        *self.signer.write() = signer;
        info!(signer = ?address, "Signer changed");
    }

    /// Rebind to the deployment on `chain_id` and reload.
    pub async fn switch_network(&self, chain_id: Option<u64>) {
        let binding = self.deployments().resolve(chain_id);
        *self.binding.write() = binding;
        {
            let mut state = self.state.lock();
            state.loading = false;
            state.error = None;
        }
        info!(chain_id = ?chain_id, contract = ?binding.address, "Switched network");
        self.refresh().await;
    }

    fn is_current(&self, contract: Address) -> bool {
        self.binding.read().address == Some(contract)
    }

    /// Reload every auction of the active contract.
    ///
    /// Failures are recorded in the snapshot. Results for a contract that is no
    /// longer active are discarded.
    pub async fn refresh(&self) {
        let (contract, ledger) = match (self.contract_address(), self.ledger.clone()) {
            (Some(contract), Some(ledger)) => (contract, ledger),
            _ => {
                debug!("No contract or ledger; auction list unknown");
                let mut state = self.state.lock();
                state.auctions = None;
                state.auctions_contract = None;
                return;
            }
        };

        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }
        let _loading = LoadingGuard {
            session: self,
            contract,
        };

        let result = fetch_auctions(ledger.as_ref(), contract).await;

        if !self.is_current(contract) {
            warn!(contract = %contract, "Discarding auction refresh for inactive contract");
            return;
        }

        let mut state = self.state.lock();
        match result {
            Ok(auctions) => {
                state.auctions = Some(auctions);
                state.auctions_contract = Some(contract);
            }
            Err(e) => {
                warn!(contract = %contract, error = %e, "Auction refresh failed");
                if state.auctions_contract != Some(contract) {
                    state.auctions = None;
                    state.auctions_contract = None;
                }
                state.error = Some(e.to_string());
            }
        }
    }

    fn write_context(&self) -> ClientResult<WriteContext> {
        let contract = self
            .contract_address()
            .ok_or(ClientError::NotReady("contract address"))?;
        let signer = self.signer().ok_or(ClientError::NotReady("signer"))?;
        let service = self
            .service
            .clone()
            .ok_or(ClientError::NotReady("coprocessor"))?;
        let ledger = self.ledger.clone().ok_or(ClientError::NotReady("ledger"))?;
        Ok(WriteContext {
            contract,
            ledger,
            signer,
            service,
        })
    }

    fn set_message(&self, message: &str) {
        self.state.lock().message = Some(message.to_string());
    }

    /// Create an auction, then reload the list.
    pub async fn create_auction(&self, request: CreateAuctionRequest) -> ClientResult<TxReceipt> {
        let ctx = self.write_context()?;
        let call = request.into_call()?;

        let receipt = {
            let _pending = PendingGuard::enter(&self.state);
            self.set_message(STATUS_CREATING_AUCTION);
            let receipt = ctx.submit(call).await?;
            self.set_message(STATUS_AUCTION_CREATED);
            receipt
        };

        self.refresh().await;
        Ok(receipt)
    }

    /// Seal a bid with the coprocessor and submit it.
    pub async fn place_encrypted_bid(&self, request: PlaceBidRequest) -> ClientResult<TxReceipt> {
        let ctx = self.write_context()?;
        let amount = request.amount()?;

        let _pending = PendingGuard::enter(&self.state);
        ctx.place_encrypted_bid(request.auction_id, amount, |status| {
            self.set_message(status)
        })
        .await
    }

    /// Reveal the connected account's own bid on `auction_id`.
    pub async fn decrypt_my_bid(&self, auction_id: U256) -> ClientResult<U256> {
        let contract = self
            .contract_address()
            .ok_or(ClientError::NotReady("contract address"))?;
        let signer = self.signer().ok_or(ClientError::NotReady("signer"))?;
        let service = self
            .service
            .clone()
            .ok_or(ClientError::NotReady("coprocessor"))?;
        let ledger = self.ledger.clone().ok_or(ClientError::NotReady("ledger"))?;

        let ctx = DecryptContext {
            contract,
            ledger: ledger.as_ref(),
            service: service.as_ref(),
            signer: signer.as_ref(),
            cache: &self.cache,
        };
        ctx.decrypt_my_bid(auction_id, |status| self.set_message(status))
            .await
    }
}

fn build_cache(
    config: &ClientConfig,
    storage: Arc<dyn StringStorage>,
    clock: Arc<dyn Clock>,
) -> DecryptionAuthorizationCache {
    DecryptionAuthorizationCache::new(storage, clock)
        .with_namespace(config.storage_namespace.clone())
        .with_duration_days(config.authorization_duration_days)
}
