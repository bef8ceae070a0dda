//! Version-independent operation requests
//!
//! A request carries fully resolved values (base-unit amounts, concrete
//! addresses); each version's encoder picks the fields its signature
//! takes. Fields a version predates are ignored by its encoder, so the
//! same request encodes against any version that supports the operation.

use alloy_primitives::{Address, Bytes, U256};
use turnstile_core::{OperationKind, TxError};

/// Hook contract addresses for `set_event_hooks`. Versions with fewer
/// hook slots encode a prefix of these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventHooks {
    pub on_key_purchase: Address,
    pub on_key_cancel: Address,
    pub on_valid_key: Address,
    pub on_token_uri: Address,
}

/// A state-changing operation, resolved and ready to encode.
///
/// Amounts are base units; human-decimal conversion happens before a
/// request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    CreateLock {
        expiration_duration: U256,
        /// Zero address means native currency
        token_address: Address,
        key_price: U256,
        /// Raw encoding; all-ones means unlimited
        max_number_of_keys: U256,
        name: String,
    },
    PurchaseKey {
        /// Base-unit price; becomes the ERC20 amount argument on v7+
        value: U256,
        recipient: Address,
        referrer: Address,
        data: Bytes,
    },
    GrantKeys {
        recipients: Vec<Address>,
        expiration_timestamps: Vec<U256>,
        key_managers: Vec<Address>,
    },
    Withdraw {
        token_address: Address,
        /// Zero withdraws the full balance
        amount: U256,
    },
    SetKeyPrice {
        key_price: U256,
        token_address: Address,
    },
    SetExpirationDuration {
        duration: U256,
    },
    SetMaxKeys {
        max_number_of_keys: U256,
    },
    SetBaseUri {
        base_token_uri: String,
    },
    SetEventHooks {
        hooks: EventHooks,
    },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateLock { .. } => OperationKind::CreateLock,
            Self::PurchaseKey { .. } => OperationKind::PurchaseKey,
            Self::GrantKeys { .. } => OperationKind::GrantKeys,
            Self::Withdraw { .. } => OperationKind::Withdraw,
            Self::SetKeyPrice { .. } => OperationKind::SetKeyPrice,
            Self::SetExpirationDuration { .. } => OperationKind::SetExpirationDuration,
            Self::SetMaxKeys { .. } => OperationKind::SetMaxKeys,
            Self::SetBaseUri { .. } => OperationKind::SetBaseUri,
            Self::SetEventHooks { .. } => OperationKind::SetEventHooks,
        }
    }
}

/// Encoder invoked with a request of the wrong variant. Table entries
/// are keyed by kind, so this only fires on a registry wiring bug.
pub(crate) fn mismatch(request: &OperationRequest) -> TxError {
    TxError::EncodeFailed {
        operation: request.kind(),
        message: "request variant does not match table entry".to_string(),
    }
}
