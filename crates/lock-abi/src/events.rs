//! Decoded contract events

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// The events the library extracts results from, named independently of
/// the per-version signature that carries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Factory announcing a newly deployed lock
    NewLock,
    /// Key mint/transfer (NFT `Transfer`)
    Transfer,
    /// Key price (and, from v7, currency) changed
    PriceChanged,
    /// Funds left the lock
    Withdrawal,
}

/// One decoded field of an event, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Address(Address),
    Uint(U256),
    Bytes(Vec<u8>),
    Str(String),
}

impl FieldValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

/// A decoded emission from a transaction receipt's logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Contract that emitted the log
    pub address: Address,
    /// Version-specific event name (e.g. `PricingChanged` on v7+)
    pub name: String,
    /// Field values in declaration order, indexed fields first
    pub fields: Vec<FieldValue>,
}

impl EventRecord {
    pub fn field_address(&self, index: usize) -> Option<Address> {
        self.fields.get(index).and_then(FieldValue::as_address)
    }

    pub fn field_uint(&self, index: usize) -> Option<U256> {
        self.fields.get(index).and_then(FieldValue::as_uint)
    }
}
