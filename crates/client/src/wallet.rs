//! Wallet signing.

use std::fs;
use std::path::Path;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use cipherbid_crypto::WalletKey;
use cipherbid_types::AuthorizationMessage;

use crate::storage::StorageError;

/// Why a signature request produced no signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("User rejected the signature request")]
    Rejected,

    #[error("Signing failed: {0}")]
    Failed(String),
}

/// The caller's wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Account the wallet signs for.
    fn address(&self) -> Address;

    /// Prompt the user to sign an authorization message.
    async fn sign_authorization(&self, message: &AuthorizationMessage) -> Result<Bytes, SignError>;
}

/// Wallet backed by a local key. Signs without prompting.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    key: WalletKey,
}

/// Key file contents.
#[derive(Debug, Serialize, Deserialize)]
struct WalletFile {
    /// Hex-encoded 32-byte seed
    seed: String,
}

impl LocalWallet {
    pub fn new(key: WalletKey) -> Self {
        Self { key }
    }

    pub fn random() -> Self {
        Self::new(WalletKey::generate(&mut OsRng))
    }

    /// Load the key at `path`, creating and saving a new one if absent.
    pub fn load_or_create(path: &Path) -> Result<Self, StorageError> {
        if path.exists() {
            let raw = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
            let file: WalletFile =
                serde_json::from_str(&raw).map_err(|e| StorageError::corrupt(path, e))?;
            let seed: [u8; 32] = hex::decode(file.seed.trim_start_matches("0x"))
                .ok()
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or_else(|| StorageError::Invalid {
                    path: path.to_path_buf(),
                    reason: "wallet seed must be 32 hex-encoded bytes".to_string(),
                })?;
            return Ok(Self::new(WalletKey::from_bytes(&seed)));
        }

        let wallet = Self::random();
        let file = WalletFile {
            seed: hex::encode(wallet.key.to_bytes()),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let raw = serde_json::to_string_pretty(&file).map_err(|e| StorageError::corrupt(path, e))?;
        fs::write(path, raw).map_err(|e| StorageError::io(path, e))?;

        info!(address = %wallet.address(), path = %path.display(), "Created wallet key");
        Ok(wallet)
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign_authorization(&self, message: &AuthorizationMessage) -> Result<Bytes, SignError> {
        Ok(self.key.sign(&message.signing_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_create_persists_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("wallet.json");

        let created = LocalWallet::load_or_create(&path).unwrap();
        let loaded = LocalWallet::load_or_create(&path).unwrap();

        assert_eq!(created.address(), loaded.address());
    }

    #[tokio::test]
    async fn test_signature_verifies_for_wallet_address() {
        let wallet = LocalWallet::random();
        let message = AuthorizationMessage {
            public_key: Bytes::from(vec![1u8; 32]),
            contract_addresses: vec![Address::repeat_byte(0xc0)],
            start_timestamp: 1,
            duration_days: 1,
        };

        let signature = wallet.sign_authorization(&message).await.unwrap();
        assert!(cipherbid_crypto::verify_wallet_signature(
            wallet.address(),
            &message.signing_bytes(),
            &signature
        )
        .is_ok());
    }
}
