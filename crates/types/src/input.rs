//! Encrypted input builder.
//!
//! An input accumulates typed plaintexts bound to a `(contract, user)` pair
//! and is sealed by the coprocessor into handles plus one validity proof.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::Handle;

/// Upper bound on the summed bit-width of one input.
pub const MAX_INPUT_BITS: u32 = 2048;

/// A plaintext tagged with its encrypted type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum TypedPlaintext {
    Bool(bool),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uint128(u128),
    Address(Address),
}

impl TypedPlaintext {
    /// Bit-width of the encrypted type.
    pub fn bit_width(&self) -> u32 {
        match self {
            TypedPlaintext::Bool(_) => 2,
            TypedPlaintext::Uint8(_) => 8,
            TypedPlaintext::Uint16(_) => 16,
            TypedPlaintext::Uint32(_) => 32,
            TypedPlaintext::Uint64(_) => 64,
            TypedPlaintext::Uint128(_) => 128,
            TypedPlaintext::Address(_) => 160,
        }
    }
}

/// Builder for one encrypted input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedInput {
    contract_address: Address,
    user_address: Address,
    values: Vec<TypedPlaintext>,
}

impl EncryptedInput {
    /// Start an input bound to a contract and the account submitting it.
    pub fn new(contract_address: Address, user_address: Address) -> Self {
        Self {
            contract_address,
            user_address,
            values: Vec::new(),
        }
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.push(TypedPlaintext::Bool(value))
    }

    pub fn add8(&mut self, value: u8) -> &mut Self {
        self.push(TypedPlaintext::Uint8(value))
    }

    pub fn add16(&mut self, value: u16) -> &mut Self {
        self.push(TypedPlaintext::Uint16(value))
    }

    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.push(TypedPlaintext::Uint32(value))
    }

    pub fn add64(&mut self, value: u64) -> &mut Self {
        self.push(TypedPlaintext::Uint64(value))
    }

    pub fn add128(&mut self, value: u128) -> &mut Self {
        self.push(TypedPlaintext::Uint128(value))
    }

    pub fn add_address(&mut self, value: Address) -> &mut Self {
        self.push(TypedPlaintext::Address(value))
    }

    fn push(&mut self, value: TypedPlaintext) -> &mut Self {
        self.values.push(value);
        self
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn user_address(&self) -> Address {
        self.user_address
    }

    pub fn values(&self) -> &[TypedPlaintext] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Summed bit-width of all values added so far.
    pub fn total_bits(&self) -> u32 {
        self.values.iter().map(TypedPlaintext::bit_width).sum()
    }
}

/// Sealed input: one handle per added value, plus the proof covering them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedInput {
    pub handles: Vec<Handle>,
    pub input_proof: Bytes,
}
