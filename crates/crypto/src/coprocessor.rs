//! In-memory coprocessor: sealed inputs, access control and user decryption.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, Bytes, B256, U256};
use hmac::{digest::KeyInit, Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use cipherbid_types::{
    ClearValue, EncryptedInput, Handle, SealedInput, TypedPlaintext, UserDecryptRequest,
    MAX_INPUT_BITS, SECONDS_PER_DAY,
};

use crate::error::CoprocessorError;
use crate::keys::{keypair_matches, verify_wallet_signature};

type HmacSha256 = Hmac<Sha256>;

/// Bytes of the big-endian handle count at the front of a proof.
const PROOF_COUNT_LEN: usize = 2;

/// A stored ciphertext and the accounts allowed to reveal it.
#[derive(Debug, Clone)]
struct Ciphertext {
    value: TypedPlaintext,
    contract: Address,
    allowed: HashSet<Address>,
}

/// Local confidential-computation engine.
#[derive(Debug)]
pub struct Coprocessor {
    /// HMAC key for input proofs, one SHA-256 block long
    proof_key: [u8; 64],
    ciphertexts: HashMap<Handle, Ciphertext>,
    /// Per-input nonce mixed into handle derivation
    nonce: u64,
}

impl Coprocessor {
    /// Create a coprocessor with a fresh proof key.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut proof_key = [0u8; 64];
        rng.fill_bytes(&mut proof_key);
        Self {
            proof_key,
            ciphertexts: HashMap::new(),
            nonce: 0,
        }
    }

    /// Seal an input into one handle per value plus a proof covering all of them.
    ///
    /// Proof layout: `count (u16 BE) || handles (32 * count) || hmac (32)`.
    pub fn encrypt(&mut self, input: &EncryptedInput) -> Result<SealedInput, CoprocessorError> {
        if input.is_empty() {
            return Err(CoprocessorError::EmptyInput);
        }
        let bits = input.total_bits();
        if bits > MAX_INPUT_BITS {
            return Err(CoprocessorError::InputTooLarge {
                bits,
                max: MAX_INPUT_BITS,
            });
        }

        let count = u16::try_from(input.values().len()).map_err(|_| {
            CoprocessorError::InputTooLarge {
                bits,
                max: MAX_INPUT_BITS,
            }
        })?;

        self.nonce += 1;
        let contract = input.contract_address();
        let user = input.user_address();

        let mut handles = Vec::with_capacity(input.values().len());
        for (index, value) in input.values().iter().enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(b"cipherbid:handle");
            hasher.update(contract.as_slice());
            hasher.update(user.as_slice());
            hasher.update(self.nonce.to_be_bytes());
            hasher.update((index as u32).to_be_bytes());
            let handle = B256::from_slice(&hasher.finalize());

            self.ciphertexts.insert(
                handle,
                Ciphertext {
                    value: value.clone(),
                    contract,
                    allowed: HashSet::new(),
                },
            );
            handles.push(handle);
        }

        let tag = self.proof_mac(contract, user, &handles).finalize().into_bytes();
        let mut proof = Vec::with_capacity(PROOF_COUNT_LEN + 32 * handles.len() + tag.len());
        proof.extend_from_slice(&count.to_be_bytes());
        for handle in &handles {
            proof.extend_from_slice(handle.as_slice());
        }
        proof.extend_from_slice(&tag);

        debug!(
            contract = %contract,
            user = %user,
            handles = handles.len(),
            bits,
            "Sealed encrypted input"
        );

        Ok(SealedInput {
            handles,
            input_proof: Bytes::from(proof),
        })
    }

    /// Verify that `handle` was sealed for `(contract, sender)` under `proof`.
    pub fn verify_input(
        &self,
        contract: Address,
        sender: Address,
        handle: Handle,
        proof: &[u8],
    ) -> Result<(), CoprocessorError> {
        if proof.len() < PROOF_COUNT_LEN {
            return Err(CoprocessorError::MalformedProof);
        }
        let (prefix, rest) = proof.split_at(PROOF_COUNT_LEN);
        let count = usize::from(u16::from_be_bytes([prefix[0], prefix[1]]));
        if count == 0 || rest.len() != 32 * count + 32 {
            return Err(CoprocessorError::MalformedProof);
        }
        let (body, tag) = rest.split_at(32 * count);

        let handles: Vec<Handle> = body
            .chunks_exact(32)
            .map(B256::from_slice)
            .collect();
        if !handles.contains(&handle) {
            return Err(CoprocessorError::InvalidProof);
        }

        self.proof_mac(contract, sender, &handles)
            .verify_slice(tag)
            .map_err(|_| CoprocessorError::InvalidProof)?;

        let stored = self
            .ciphertexts
            .get(&handle)
            .ok_or(CoprocessorError::UnknownHandle(handle))?;
        if stored.contract != contract {
            return Err(CoprocessorError::InvalidProof);
        }

        Ok(())
    }

    /// Grant `account` the right to reveal `handle`.
    pub fn allow(&mut self, handle: Handle, account: Address) -> Result<(), CoprocessorError> {
        let stored = self
            .ciphertexts
            .get_mut(&handle)
            .ok_or(CoprocessorError::UnknownHandle(handle))?;
        stored.allowed.insert(account);
        Ok(())
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        self.ciphertexts
            .get(handle)
            .is_some_and(|c| c.allowed.contains(account))
    }

    /// Reveal handles to the requesting user.
    ///
    /// Checks, in order: the validity window at `now`, the ephemeral key
    /// pair, the wallet signature over the authorization message, and for
    /// every handle the contract scope and the access list.
    pub fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
        now: u64,
    ) -> Result<Vec<(Handle, ClearValue)>, CoprocessorError> {
        if request.handles.is_empty() {
            return Err(CoprocessorError::EmptyRequest);
        }

        let expires_at = request
            .start_timestamp
            .saturating_add(request.duration_days.saturating_mul(SECONDS_PER_DAY));
        if now < request.start_timestamp || now >= expires_at {
            return Err(CoprocessorError::AuthorizationExpired);
        }

        if !keypair_matches(&request.private_key, &request.public_key) {
            return Err(CoprocessorError::KeyPairMismatch);
        }

        verify_wallet_signature(
            request.user_address,
            &request.message().signing_bytes(),
            &request.signature,
        )?;

        let mut out = Vec::with_capacity(request.handles.len());
        for pair in &request.handles {
            if !request.contract_addresses.contains(&pair.contract_address) {
                return Err(CoprocessorError::ContractNotAuthorized(pair.contract_address));
            }

            let stored = self
                .ciphertexts
                .get(&pair.handle)
                .ok_or(CoprocessorError::UnknownHandle(pair.handle))?;
            if stored.contract != pair.contract_address {
                return Err(CoprocessorError::ContractNotAuthorized(pair.contract_address));
            }
            if !stored.allowed.contains(&request.user_address) {
                return Err(CoprocessorError::NotAllowed {
                    handle: pair.handle,
                    account: request.user_address,
                });
            }

            out.push((pair.handle, clear_value(&stored.value)));
        }

        info!(
            user = %request.user_address,
            handles = out.len(),
            "User decryption completed"
        );

        Ok(out)
    }

    fn proof_mac(&self, contract: Address, user: Address, handles: &[Handle]) -> HmacSha256 {
        let mut mac = <HmacSha256 as KeyInit>::new(&self.proof_key.into());
        Mac::update(&mut mac, contract.as_slice());
        Mac::update(&mut mac, user.as_slice());
        for handle in handles {
            Mac::update(&mut mac, handle.as_slice());
        }
        mac
    }
}

fn clear_value(value: &TypedPlaintext) -> ClearValue {
    match value {
        TypedPlaintext::Bool(flag) => ClearValue::Bool(*flag),
        TypedPlaintext::Uint8(v) => ClearValue::Uint(U256::from(*v)),
        TypedPlaintext::Uint16(v) => ClearValue::Uint(U256::from(*v)),
        TypedPlaintext::Uint32(v) => ClearValue::Uint(U256::from(*v)),
        TypedPlaintext::Uint64(v) => ClearValue::Uint(U256::from(*v)),
        TypedPlaintext::Uint128(v) => ClearValue::Uint(U256::from(*v)),
        TypedPlaintext::Address(a) => ClearValue::Uint(U256::from_be_slice(a.as_slice())),
    }
}
