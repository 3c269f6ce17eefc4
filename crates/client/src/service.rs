//! Confidential computation service consumed by the client.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use cipherbid_types::{
    AuthorizationMessage, ClearValue, EncryptedInput, EphemeralKeyPair, Handle, SealedInput,
    UserDecryptRequest,
};

use crate::error::ClientResult;

/// The coprocessor: seals encrypted inputs and reveals handles to their owners.
#[async_trait]
pub trait ConfidentialService: Send + Sync {
    /// Start an input bound to `(contract, caller)`.
    fn create_encrypted_input(&self, contract: Address, caller: Address) -> EncryptedInput {
        EncryptedInput::new(contract, caller)
    }

    /// Seal an input into handles plus a validity proof.
    async fn encrypt(&self, input: EncryptedInput) -> ClientResult<SealedInput>;

    /// Generate the ephemeral key pair for a new authorization.
    fn generate_keypair(&self) -> EphemeralKeyPair;

    /// Build the message a wallet signs to authorize user decryption.
    fn authorization_message(
        &self,
        public_key: Bytes,
        contract_addresses: Vec<Address>,
        start_timestamp: u64,
        duration_days: u64,
    ) -> AuthorizationMessage {
        AuthorizationMessage {
            public_key,
            contract_addresses,
            start_timestamp,
            duration_days,
        }
    }

    /// Reveal handles under a signed authorization.
    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> ClientResult<HashMap<Handle, ClearValue>>;
}
