//! Decryption authorization cache.
//!
//! Signing an authorization is a wallet prompt, so a credential is created
//! once per `(user, contract set)` scope and reused from the caller's store
//! until its validity window closes.

use std::sync::Arc;

use alloy_primitives::Address;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use cipherbid_types::DecryptionAuthorization;

use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::service::ConfidentialService;
use crate::storage::StringStorage;
use crate::wallet::{SignError, WalletSigner};

/// Creates, persists and reuses decryption authorizations.
pub struct DecryptionAuthorizationCache {
    storage: Arc<dyn StringStorage>,
    clock: Arc<dyn Clock>,
    namespace: String,
    duration_days: u64,
    /// Serializes load-or-sign so concurrent callers share one prompt
    signing: AsyncMutex<()>,
}

impl DecryptionAuthorizationCache {
    pub fn new(storage: Arc<dyn StringStorage>, clock: Arc<dyn Clock>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            storage,
            clock,
            namespace: defaults.storage_namespace,
            duration_days: defaults.authorization_duration_days,
            signing: AsyncMutex::new(()),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_duration_days(mut self, duration_days: u64) -> Self {
        self.duration_days = duration_days.max(1);
        self
    }

    /// Store key for a scope. Contract order and duplicates do not matter.
    pub fn cache_key(&self, user_address: Address, contract_addresses: &[Address]) -> String {
        let mut contracts = contract_addresses.to_vec();
        contracts.sort();
        contracts.dedup();

        let mut hasher = Sha256::new();
        for contract in &contracts {
            hasher.update(contract.as_slice());
        }

        format!(
            "{}:{}:{}",
            self.namespace,
            hex::encode(user_address.as_slice()),
            hex::encode(hasher.finalize())
        )
    }

    /// A stored authorization for this scope that is valid now, if any.
    pub fn load(
        &self,
        user_address: Address,
        contract_addresses: &[Address],
    ) -> Option<DecryptionAuthorization> {
        let key = self.cache_key(user_address, contract_addresses);

        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored authorization");
                return None;
            }
        };

        let authorization: DecryptionAuthorization = match serde_json::from_str(&raw) {
            Ok(authorization) => authorization,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable stored authorization");
                return None;
            }
        };

        if !authorization.covers(user_address, contract_addresses) {
            debug!(key = %key, "Stored authorization has a different scope");
            return None;
        }

        let now = self.clock.now();
        if !authorization.is_valid_at(now) {
            info!(
                key = %key,
                expired_at = authorization.expires_at(),
                now,
                "Stored authorization expired"
            );
            return None;
        }

        Some(authorization)
    }

    /// Reuse a valid authorization for the scope or ask the wallet for a new one.
    ///
    /// Returns `None` when the user declines or signing fails.
    pub async fn load_or_sign(
        &self,
        service: &dyn ConfidentialService,
        contract_addresses: &[Address],
        signer: &dyn WalletSigner,
    ) -> Option<DecryptionAuthorization> {
        let _signing = self.signing.lock().await;
        let user_address = signer.address();

        if let Some(authorization) = self.load(user_address, contract_addresses) {
            debug!(user = %user_address, "Reusing stored decryption authorization");
            return Some(authorization);
        }

        let keypair = service.generate_keypair();
        let start_timestamp = self.clock.now();
        let message = service.authorization_message(
            keypair.public_key.clone(),
            contract_addresses.to_vec(),
            start_timestamp,
            self.duration_days,
        );

        let signature = match signer.sign_authorization(&message).await {
            Ok(signature) => signature,
            Err(SignError::Rejected) => {
                info!(user = %user_address, "User declined to sign decryption authorization");
                return None;
            }
            Err(e) => {
                warn!(user = %user_address, error = %e, "Failed to sign decryption authorization");
                return None;
            }
        };

        let authorization = DecryptionAuthorization {
            user_address,
            contract_addresses: message.contract_addresses,
            start_timestamp: message.start_timestamp,
            duration_days: message.duration_days,
            public_key: keypair.public_key,
            private_key: keypair.private_key,
            signature,
        };

        self.save(&authorization);
        info!(
            user = %user_address,
            contracts = authorization.contract_addresses.len(),
            expires_at = authorization.expires_at(),
            "Created decryption authorization"
        );

        Some(authorization)
    }

    fn save(&self, authorization: &DecryptionAuthorization) {
        let key = self.cache_key(
            authorization.user_address,
            &authorization.contract_addresses,
        );
        let raw = match serde_json::to_string(authorization) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize authorization");
                return;
            }
        };
        if let Err(e) = self.storage.set(&key, raw) {
            warn!(key = %key, error = %e, "Failed to persist authorization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use crate::testing::{FakeService, FakeSigner};
    use cipherbid_types::SECONDS_PER_DAY;

    const NOW: u64 = 1_700_000_000;

    struct Fixture {
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
        cache: DecryptionAuthorizationCache,
        service: FakeService,
        signer: FakeSigner,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let cache = DecryptionAuthorizationCache::new(storage.clone(), clock.clone())
            .with_duration_days(1);
        Fixture {
            storage,
            clock,
            cache,
            service: FakeService::new(),
            signer: FakeSigner::new(Address::repeat_byte(0xaa)),
        }
    }

    fn vault() -> Address {
        Address::repeat_byte(0xc0)
    }

    #[tokio::test]
    async fn test_second_call_reuses_authorization() {
        let f = fixture();

        let first = f
            .cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .unwrap();
        let second = f
            .cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(f.signer.sign_calls(), 1);
        assert_eq!(f.storage.len(), 1);
        assert_eq!(first.start_timestamp, NOW);
        assert_eq!(first.user_address, f.signer.address());
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_prompt() {
        let f = fixture();

        let vaults_a = [vault()];
        let vaults_b = [vault()];
        let (a, b) = tokio::join!(
            f.cache.load_or_sign(&f.service, &vaults_a, &f.signer),
            f.cache.load_or_sign(&f.service, &vaults_b, &f.signer),
        );

        assert_eq!(a, b);
        assert_eq!(f.signer.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_authorization_is_regenerated() {
        let f = fixture();

        let first = f
            .cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .unwrap();

        f.clock.advance(SECONDS_PER_DAY);
        assert!(f.cache.load(f.signer.address(), &[vault()]).is_none());

        let second = f
            .cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .unwrap();

        assert_eq!(f.signer.sign_calls(), 2);
        assert_ne!(first.public_key, second.public_key);
        assert_eq!(second.start_timestamp, NOW + SECONDS_PER_DAY);
    }

    #[tokio::test]
    async fn test_declined_signature_returns_none() {
        let f = fixture();
        f.signer.set_reject(true);

        let result = f.cache.load_or_sign(&f.service, &[vault()], &f.signer).await;

        assert!(result.is_none());
        assert!(f.storage.is_empty());

        f.signer.set_reject(false);
        assert!(f
            .cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_scope_is_per_user_and_contract_set() {
        let f = fixture();
        let other_vault = Address::repeat_byte(0xc1);
        let other_signer = FakeSigner::new(Address::repeat_byte(0xbb));

        f.cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .unwrap();
        f.cache
            .load_or_sign(&f.service, &[other_vault], &f.signer)
            .await
            .unwrap();
        f.cache
            .load_or_sign(&f.service, &[vault()], &other_signer)
            .await
            .unwrap();

        assert_eq!(f.signer.sign_calls(), 2);
        assert_eq!(other_signer.sign_calls(), 1);
        assert_eq!(f.storage.len(), 3);

        assert_eq!(
            f.cache.cache_key(f.signer.address(), &[vault(), other_vault]),
            f.cache.cache_key(f.signer.address(), &[other_vault, vault(), vault()])
        );
    }

    #[tokio::test]
    async fn test_unreadable_record_is_replaced() {
        let f = fixture();
        let key = f.cache.cache_key(f.signer.address(), &[vault()]);
        f.storage.set(&key, "{not json".to_string()).unwrap();

        let authorization = f
            .cache
            .load_or_sign(&f.service, &[vault()], &f.signer)
            .await
            .unwrap();

        assert_eq!(f.signer.sign_calls(), 1);
        let stored = f.storage.get(&key).unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<DecryptionAuthorization>(&stored).unwrap(),
            authorization
        );
    }
}
