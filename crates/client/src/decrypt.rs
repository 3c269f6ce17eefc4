//! Decryption of the caller's own sealed bid.

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use cipherbid_types::{HandleContractPair, UserDecryptRequest};

use crate::auth::DecryptionAuthorizationCache;
use crate::error::{ClientError, ClientResult};
use crate::ledger::VaultLedger;
use crate::service::ConfidentialService;
use crate::wallet::WalletSigner;

pub const STATUS_FETCHING_BID: &str = "Fetching encrypted bid...";
pub const STATUS_DECRYPTING_BID: &str = "Decrypting bid...";

/// Collaborators needed to reveal a bid.
pub struct DecryptContext<'a> {
    pub contract: Address,
    pub ledger: &'a dyn VaultLedger,
    pub service: &'a dyn ConfidentialService,
    pub signer: &'a dyn WalletSigner,
    pub cache: &'a DecryptionAuthorizationCache,
}

impl DecryptContext<'_> {
    /// Reveal the caller's bid on `auction_id`.
    ///
    /// The coprocessor is not contacted when no bid exists.
    pub async fn decrypt_my_bid(
        &self,
        auction_id: U256,
        on_status: impl Fn(&'static str),
    ) -> ClientResult<U256> {
        let account = self.signer.address();

        on_status(STATUS_FETCHING_BID);
        let handle = self
            .ledger
            .bid_handle(self.contract, auction_id, account)
            .await?;
        if handle.is_zero() {
            debug!(auction_id = %auction_id, account = %account, "No bid to decrypt");
            return Err(ClientError::BidNotFound(auction_id));
        }

        let authorization = self
            .cache
            .load_or_sign(self.service, &[self.contract], self.signer)
            .await
            .ok_or(ClientError::AuthorizationDenied)?;

        on_status(STATUS_DECRYPTING_BID);
        let request = UserDecryptRequest::new(
            vec![HandleContractPair {
                handle,
                contract_address: self.contract,
            }],
            &authorization,
        );
        let values = self.service.user_decrypt(request).await?;

        let value = values.get(&handle).ok_or(ClientError::EmptyResult)?;
        let amount = value.to_u256().ok_or_else(|| {
            ClientError::Decryption(format!("value for {handle} is not numeric"))
        })?;

        info!(auction_id = %auction_id, account = %account, "Decrypted bid");
        Ok(amount)
    }
}
