//! Wallet and ephemeral keys.

use alloy_primitives::{Address, Bytes};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use cipherbid_types::EphemeralKeyPair;

use crate::error::CoprocessorError;

/// Wallet signature length: verifying key (32) || signature (64).
pub const WALLET_SIGNATURE_LEN: usize = 96;

/// An account key able to sign authorization messages.
#[derive(Clone, Debug)]
pub struct WalletKey {
    signing_key: SigningKey,
}

impl WalletKey {
    /// Generate a fresh wallet key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Restore a wallet key from its 32-byte seed.
    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The 32-byte seed.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Account address controlled by this key.
    pub fn address(&self) -> Address {
        address_of(&self.signing_key.verifying_key())
    }

    /// Sign a message. The result embeds the verifying key.
    pub fn sign(&self, message: &[u8]) -> Bytes {
        let signature = self.signing_key.sign(message);
        let mut out = Vec::with_capacity(WALLET_SIGNATURE_LEN);
        out.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        out.extend_from_slice(&signature.to_bytes());
        Bytes::from(out)
    }
}

/// Derive the account address for a verifying key.
pub fn address_of(verifying_key: &VerifyingKey) -> Address {
    let digest = Sha256::digest(verifying_key.as_bytes());
    Address::from_slice(&digest[12..])
}

/// Check that `signature` was produced over `message` by the key behind `expected`.
pub fn verify_wallet_signature(
    expected: Address,
    message: &[u8],
    signature: &[u8],
) -> Result<(), CoprocessorError> {
    if signature.len() != WALLET_SIGNATURE_LEN {
        return Err(CoprocessorError::InvalidSignature);
    }

    let key_bytes: [u8; 32] = signature[..32]
        .try_into()
        .map_err(|_| CoprocessorError::InvalidSignature)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| CoprocessorError::InvalidSignature)?;

    let recovered = address_of(&verifying_key);
    if recovered != expected {
        return Err(CoprocessorError::SignerMismatch {
            expected,
            recovered,
        });
    }

    let signature =
        Signature::from_slice(&signature[32..]).map_err(|_| CoprocessorError::InvalidSignature)?;
    verifying_key
        .verify(message, &signature)
        .map_err(|_| CoprocessorError::InvalidSignature)
}

/// Generate the ephemeral key pair embedded in a decryption authorization.
pub fn generate_ephemeral_keypair<R: RngCore + CryptoRng>(rng: &mut R) -> EphemeralKeyPair {
    let signing_key = SigningKey::generate(rng);
    EphemeralKeyPair {
        public_key: Bytes::copy_from_slice(signing_key.verifying_key().as_bytes()),
        private_key: Bytes::copy_from_slice(&signing_key.to_bytes()),
    }
}

/// Whether `private_key` is the secret half of `public_key`.
pub fn keypair_matches(private_key: &[u8], public_key: &[u8]) -> bool {
    let Ok(seed) = <[u8; 32]>::try_from(private_key) else {
        return false;
    };
    SigningKey::from_bytes(&seed).verifying_key().as_bytes() == public_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_verify() {
        let key = WalletKey::generate(&mut OsRng);
        let signature = key.sign(b"authorize");

        assert_eq!(signature.len(), WALLET_SIGNATURE_LEN);
        assert!(verify_wallet_signature(key.address(), b"authorize", &signature).is_ok());
    }

    #[test]
    fn test_tampered_message_fails() {
        let key = WalletKey::generate(&mut OsRng);
        let signature = key.sign(b"authorize");

        assert_eq!(
            verify_wallet_signature(key.address(), b"authorise", &signature),
            Err(CoprocessorError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_signer_fails() {
        let alice = WalletKey::generate(&mut OsRng);
        let mallory = WalletKey::generate(&mut OsRng);
        let signature = mallory.sign(b"authorize");

        assert!(matches!(
            verify_wallet_signature(alice.address(), b"authorize", &signature),
            Err(CoprocessorError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn test_seed_roundtrip_keeps_address() {
        let key = WalletKey::generate(&mut OsRng);
        let restored = WalletKey::from_bytes(&key.to_bytes());
        assert_eq!(key.address(), restored.address());
    }

    #[test]
    fn test_ephemeral_keypair_matches() {
        let pair = generate_ephemeral_keypair(&mut OsRng);
        let other = generate_ephemeral_keypair(&mut OsRng);

        assert!(keypair_matches(&pair.private_key, &pair.public_key));
        assert!(!keypair_matches(&pair.private_key, &other.public_key));
        assert!(!keypair_matches(&[0u8; 3], &pair.public_key));
    }
}
