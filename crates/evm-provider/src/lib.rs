//! evm-provider: The chain boundary consumed by Turnstile
//!
//! The core treats the RPC transport as an opaque capability: anything
//! that can execute read calls, broadcast signed transactions, fetch
//! receipts, and report the chain head conforms. Signing is a separate
//! capability so key management stays outside the library.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use turnstile_core::ProviderError;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// An unsigned operation descriptor: a call target, attached native
/// value, and ABI-encoded calldata. Building one never touches the
/// network; submission is a separate step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallData {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl CallData {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A transaction ready for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
}

impl TransactionRequest {
    pub fn from_call(from: Address, call: CallData, gas_limit: u64) -> Self {
        Self {
            from,
            to: call.to,
            value: call.value,
            data: call.data,
            gas_limit,
        }
    }
}

/// A signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub hash: B256,
}

/// One log entry from a transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Contract that emitted the log
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Receipt for a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    /// `false` means the transaction reverted
    pub status: bool,
    pub block_number: u64,
    pub logs: Vec<LogEntry>,
    /// Revert reason, when the node reports one
    pub revert_reason: Option<String>,
}

/// Read and broadcast capability over a chain node
#[async_trait]
pub trait Provider: Send + Sync {
    /// Execute a read-only call against a contract. A revert surfaces as
    /// `ProviderError::Rpc`.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Broadcast a signed transaction, returning its hash
    async fn send_transaction(&self, tx: SignedTransaction) -> Result<B256>;

    /// Receipt for a transaction; `None` while it is not yet mined
    async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    /// Current chain head
    async fn block_number(&self) -> Result<u64>;

    /// Native-currency balance of an address
    async fn balance(&self, address: Address) -> Result<U256>;
}

/// Capability to sign a prepared transaction for one account
#[async_trait]
pub trait Signer: Send + Sync {
    /// The account transactions are sent from
    fn address(&self) -> Address;

    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<SignedTransaction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_data_defaults_to_zero_value() {
        let call = CallData::new(Address::repeat_byte(1), vec![0xde, 0xad]);
        assert_eq!(call.value, U256::ZERO);

        let call = call.with_value(U256::from(7u64));
        assert_eq!(call.value, U256::from(7u64));
    }

    #[test]
    fn request_carries_call_fields() {
        let call = CallData::new(Address::repeat_byte(2), vec![1, 2, 3]).with_value(U256::from(5u64));
        let req = TransactionRequest::from_call(Address::repeat_byte(9), call.clone(), 21_000);
        assert_eq!(req.to, call.to);
        assert_eq!(req.value, call.value);
        assert_eq!(req.data, call.data);
        assert_eq!(req.from, Address::repeat_byte(9));
        assert_eq!(req.gas_limit, 21_000);
    }
}
