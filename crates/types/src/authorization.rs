//! Decryption authorization types.
//!
//! A [`DecryptionAuthorization`] is a time-boxed credential: an ephemeral key
//! pair plus the caller's wallet signature over an [`AuthorizationMessage`]
//! binding that key to a set of contracts and a validity window.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::Handle;

pub const SECONDS_PER_DAY: u64 = 86_400;

const MESSAGE_DOMAIN: &[u8] = b"cipherbid:user-decrypt:v1";

/// Ephemeral key pair generated for one authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralKeyPair {
    pub public_key: Bytes,
    pub private_key: Bytes,
}

/// Message the caller's wallet signs to create an authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationMessage {
    pub public_key: Bytes,
    pub contract_addresses: Vec<Address>,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl AuthorizationMessage {
    /// Canonical byte encoding covered by the wallet signature.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            MESSAGE_DOMAIN.len() + 24 + self.public_key.len() + 20 * self.contract_addresses.len(),
        );
        out.extend_from_slice(MESSAGE_DOMAIN);
        out.extend_from_slice(&(self.public_key.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.public_key);
        out.extend_from_slice(&(self.contract_addresses.len() as u32).to_be_bytes());
        for address in &self.contract_addresses {
            out.extend_from_slice(address.as_slice());
        }
        out.extend_from_slice(&self.start_timestamp.to_be_bytes());
        out.extend_from_slice(&self.duration_days.to_be_bytes());
        out
    }
}

/// Signed, time-boxed decryption credential.
///
/// Never mutated after creation; a new one supersedes it on expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionAuthorization {
    pub user_address: Address,
    pub contract_addresses: Vec<Address>,
    pub start_timestamp: u64,
    pub duration_days: u64,
    pub public_key: Bytes,
    pub private_key: Bytes,
    pub signature: Bytes,
}

impl DecryptionAuthorization {
    /// First second at which the credential is no longer valid.
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    /// `start <= now < start + duration`.
    pub fn is_valid_at(&self, now: u64) -> bool {
        now >= self.start_timestamp && now < self.expires_at()
    }

    /// Whether this credential was issued for exactly this user and contract set.
    pub fn covers(&self, user_address: Address, contract_addresses: &[Address]) -> bool {
        if self.user_address != user_address {
            return false;
        }
        let mut ours = self.contract_addresses.clone();
        let mut theirs = contract_addresses.to_vec();
        ours.sort();
        ours.dedup();
        theirs.sort();
        theirs.dedup();
        ours == theirs
    }

    /// The message this credential's signature covers.
    pub fn message(&self) -> AuthorizationMessage {
        AuthorizationMessage {
            public_key: self.public_key.clone(),
            contract_addresses: self.contract_addresses.clone(),
            start_timestamp: self.start_timestamp,
            duration_days: self.duration_days,
        }
    }
}

/// A ciphertext to reveal and the contract holding it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    pub handle: Handle,
    pub contract_address: Address,
}

/// Arguments of the coprocessor's user-decrypt operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecryptRequest {
    pub handles: Vec<HandleContractPair>,
    pub private_key: Bytes,
    pub public_key: Bytes,
    pub signature: Bytes,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl UserDecryptRequest {
    /// Build a request for `handles` under an authorization.
    pub fn new(handles: Vec<HandleContractPair>, authorization: &DecryptionAuthorization) -> Self {
        Self {
            handles,
            private_key: authorization.private_key.clone(),
            public_key: authorization.public_key.clone(),
            signature: authorization.signature.clone(),
            contract_addresses: authorization.contract_addresses.clone(),
            user_address: authorization.user_address,
            start_timestamp: authorization.start_timestamp,
            duration_days: authorization.duration_days,
        }
    }

    /// The message the request's signature must cover.
    pub fn message(&self) -> AuthorizationMessage {
        AuthorizationMessage {
            public_key: self.public_key.clone(),
            contract_addresses: self.contract_addresses.clone(),
            start_timestamp: self.start_timestamp,
            duration_days: self.duration_days,
        }
    }
}

/// A decrypted value in whatever representation the service returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ClearValue {
    /// Native integer
    Uint(U256),
    /// Decimal or `0x`-prefixed numeric string
    Numeric(String),
    Bool(bool),
}

impl ClearValue {
    /// Normalize to an unsigned integer. `None` if a numeric string is malformed.
    pub fn to_u256(&self) -> Option<U256> {
        match self {
            ClearValue::Uint(value) => Some(*value),
            ClearValue::Numeric(text) => U256::from_str(text.trim()).ok(),
            ClearValue::Bool(flag) => Some(U256::from(*flag as u8)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorization(start: u64, days: u64) -> DecryptionAuthorization {
        DecryptionAuthorization {
            user_address: Address::repeat_byte(7),
            contract_addresses: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            start_timestamp: start,
            duration_days: days,
            public_key: Bytes::from(vec![1u8; 32]),
            private_key: Bytes::from(vec![2u8; 32]),
            signature: Bytes::from(vec![3u8; 96]),
        }
    }

    #[test]
    fn test_validity_window_is_half_open() {
        let auth = authorization(1_000, 1);

        assert!(!auth.is_valid_at(999));
        assert!(auth.is_valid_at(1_000));
        assert!(auth.is_valid_at(1_000 + SECONDS_PER_DAY - 1));
        assert!(!auth.is_valid_at(1_000 + SECONDS_PER_DAY));
    }

    #[test]
    fn test_covers_ignores_contract_order() {
        let auth = authorization(0, 365);

        assert!(auth.covers(
            Address::repeat_byte(7),
            &[Address::repeat_byte(2), Address::repeat_byte(1)]
        ));
        assert!(!auth.covers(Address::repeat_byte(7), &[Address::repeat_byte(1)]));
        assert!(!auth.covers(
            Address::repeat_byte(8),
            &[Address::repeat_byte(1), Address::repeat_byte(2)]
        ));
    }

    #[test]
    fn test_signing_bytes_bind_every_field() {
        let base = authorization(100, 10).message();

        let mut other_window = base.clone();
        other_window.duration_days = 11;
        assert_ne!(base.signing_bytes(), other_window.signing_bytes());

        let mut other_scope = base.clone();
        other_scope.contract_addresses.pop();
        assert_ne!(base.signing_bytes(), other_scope.signing_bytes());

        let mut other_key = base.clone();
        other_key.public_key = Bytes::from(vec![9u8; 32]);
        assert_ne!(base.signing_bytes(), other_key.signing_bytes());
    }

    #[test]
    fn test_clear_value_normalization() {
        assert_eq!(
            ClearValue::Uint(U256::from(42u64)).to_u256(),
            Some(U256::from(42u64))
        );
        assert_eq!(
            ClearValue::Numeric("42".to_string()).to_u256(),
            Some(U256::from(42u64))
        );
        assert_eq!(
            ClearValue::Numeric("0x2a".to_string()).to_u256(),
            Some(U256::from(42u64))
        );
        assert_eq!(ClearValue::Bool(true).to_u256(), Some(U256::from(1u64)));
        assert_eq!(ClearValue::Numeric("forty-two".to_string()).to_u256(), None);
    }
}
