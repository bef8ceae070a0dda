//! Error types for Turnstile

use alloy_primitives::{Address, B256};
use thiserror::Error;

use crate::types::{OperationKind, VersionTag};

/// Core errors that can occur in Turnstile
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    #[error("Amount error: {0}")]
    Units(#[from] UnitError),
}

/// Failures at the RPC provider boundary
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("RPC call failed: {message}")]
    Rpc { message: String },

    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Signing failed: {message}")]
    Signer { message: String },
}

/// Protocol version resolution errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// The contract matched no known protocol version. Fatal; not retried.
    #[error("Contract {address} does not match any known protocol version")]
    Unresolved { address: Address },

    #[error("Contract {address} reports unknown version tag {tag}")]
    UnknownTag { address: Address, tag: u16 },
}

/// Read-path failures. Transient; callers may retry.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read lock {address}: {message}")]
    LockReadFailed { address: Address, message: String },

    #[error("Failed to read token {token}: {message}")]
    TokenReadFailed { token: Address, message: String },

    #[error("Failed to decode call result: {message}")]
    DecodeFailed { message: String },
}

/// Write-path failures, surfaced once a transaction reaches a terminal
/// state (an in-flight transaction's outcome is unknown until then).
#[derive(Debug, Error)]
pub enum TxError {
    #[error("Operation {operation} is not supported by {version}")]
    UnsupportedOperation {
        version: VersionTag,
        operation: OperationKind,
    },

    #[error("Failed to encode {operation}: {message}")]
    EncodeFailed {
        operation: OperationKind,
        message: String,
    },

    /// The approval transaction preceding a spend reverted. Not retried:
    /// resubmission risks a double spend.
    #[error("Approval transaction {hash} failed: {}", reason.as_deref().unwrap_or("no revert reason"))]
    ApprovalFailed { hash: B256, reason: Option<String> },

    /// The broadcast transaction reverted. Not retried.
    #[error("Transaction {hash} reverted: {}", reason.as_deref().unwrap_or("no revert reason"))]
    ExecutionReverted { hash: B256, reason: Option<String> },

    /// The confirmation wait exceeded the caller's budget. The transaction
    /// may still succeed later; the handle stays `Pending`.
    #[error("Transaction {hash} not confirmed in time ({confirmations}/{required} confirmations)")]
    ConfirmationTimeout {
        hash: B256,
        confirmations: u64,
        required: u64,
    },
}

/// Amount conversion errors
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("Invalid decimal amount: {amount:?}")]
    InvalidAmount { amount: String },

    #[error("Amount {amount:?} has more fractional digits than the token's {decimals} decimals")]
    ExcessPrecision { amount: String, decimals: u8 },

    #[error("Amount {amount:?} overflows 256 bits at {decimals} decimals")]
    Overflow { amount: String, decimals: u8 },
}

/// Result type alias for Turnstile operations
pub type Result<T> = std::result::Result<T, Error>;
