//! Core type definitions for Turnstile

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Protocol version tag (e.g. `v7`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(pub u16);

impl VersionTag {
    pub fn new(tag: u16) -> Self {
        Self(tag)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The currency a lock is priced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Chain-native currency (18 decimals)
    Native,
    /// An ERC20 token contract
    Token(TokenInfo),
}

/// Metadata for an ERC20 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Currency {
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// Decimal precision used for amount conversion
    pub fn decimals(&self) -> u8 {
        match self {
            Self::Native => constants::NATIVE_DECIMALS,
            Self::Token(info) => info.decimals,
        }
    }

    /// Token contract address, if this is not the native currency
    pub fn token_address(&self) -> Option<Address> {
        match self {
            Self::Native => None,
            Self::Token(info) => Some(info.address),
        }
    }
}

/// Maximum number of keys a lock will sell.
///
/// On-chain the all-ones sentinel means "no cap"; that raw value is
/// normalized here and never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxKeys {
    Limited(u64),
    Unlimited,
}

impl MaxKeys {
    /// Normalize the raw on-chain value
    pub fn from_raw(raw: U256) -> Self {
        if raw == constants::UNLIMITED_KEYS_SENTINEL {
            Self::Unlimited
        } else {
            Self::Limited(raw.saturating_to::<u64>())
        }
    }

    /// The raw on-chain encoding of this value
    pub fn to_raw(&self) -> U256 {
        match self {
            Self::Limited(n) => U256::from(*n),
            Self::Unlimited => constants::UNLIMITED_KEYS_SENTINEL,
        }
    }
}

/// Lifecycle status of a submitted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Constructed,
    Submitted,
    Pending,
    Mined,
    Confirmed,
    Failed,
}

impl TxStatus {
    /// Terminal statuses never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Constructed => "constructed",
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Mined => "mined",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// The kind of state-changing operation a transaction performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateLock,
    PurchaseKey,
    GrantKeys,
    Withdraw,
    SetKeyPrice,
    SetExpirationDuration,
    SetMaxKeys,
    SetBaseUri,
    SetEventHooks,
    /// ERC20 approval issued on behalf of a spending operation
    Approve,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateLock => "create_lock",
            Self::PurchaseKey => "purchase_key",
            Self::GrantKeys => "grant_keys",
            Self::Withdraw => "withdraw",
            Self::SetKeyPrice => "set_key_price",
            Self::SetExpirationDuration => "set_expiration_duration",
            Self::SetMaxKeys => "set_max_keys",
            Self::SetBaseUri => "set_base_uri",
            Self::SetEventHooks => "set_event_hooks",
            Self::Approve => "approve",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured result extracted from a confirmed transaction's logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    LockCreated { lock: Address },
    KeyMinted { token_id: U256, owner: Address },
    Withdrawn { amount: U256 },
}

/// One submitted on-chain operation, tracked through its lifecycle.
///
/// Owned by the caller; the orchestrator returns updated copies as
/// confirmations arrive. `outcome` is populated once the transaction is
/// confirmed and the expected event could be decoded; a confirmed handle
/// with no outcome means the result was indeterminate, not failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub hash: B256,
    pub operation: OperationKind,
    /// Contract the operation targets (the factory for create-lock)
    pub contract: Address,
    /// Resolved version of the target; `None` for ERC20 approvals
    pub version: Option<VersionTag>,
    pub status: TxStatus,
    pub confirmations: u64,
    pub outcome: Option<OperationOutcome>,
    /// Revert reason, set when `status` is `Failed`
    pub failure: Option<String>,
}

impl TransactionHandle {
    /// A freshly broadcast transaction
    pub fn submitted(hash: B256, operation: OperationKind, contract: Address) -> Self {
        Self {
            hash,
            operation,
            contract,
            version: None,
            status: TxStatus::Submitted,
            confirmations: 0,
            outcome: None,
            failure: None,
        }
    }

    pub fn with_version(mut self, version: VersionTag) -> Self {
        self.version = Some(version);
        self
    }
}

/// Version-independent read of a lock's on-chain state.
///
/// `key_price` and `balance` are always human-readable decimal strings in
/// the lock's currency, never raw base units. `as_of` is the block number
/// the snapshot was taken at, so callers can detect staleness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockSnapshot {
    pub address: Address,
    pub key_price: String,
    pub currency: Currency,
    /// Key validity duration in seconds
    pub expiration_duration: u64,
    pub max_number_of_keys: MaxKeys,
    pub outstanding_keys: u64,
    pub owner: Address,
    /// Payout target; equals `owner` on versions without a beneficiary
    pub beneficiary: Address,
    /// Only exposed from v8 on
    pub base_token_uri: Option<String>,
    /// Only exposed from v9 on
    pub max_keys_per_address: Option<u64>,
    pub balance: String,
    pub as_of: u64,
}

/// A single key (membership grant) as read from a lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySnapshot {
    pub lock: Address,
    pub owner: Address,
    /// Unix timestamp the key expires at; 0 when the owner has no key
    pub expiration: u64,
}

impl KeySnapshot {
    pub fn is_valid_at(&self, now: u64) -> bool {
        self.expiration > now
    }
}

/// Allowance a spender currently holds over a token, against what an
/// operation needs. Derived fresh from chain state before every spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalState {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub approved: U256,
    pub required: U256,
}

impl ApprovalState {
    pub fn is_sufficient(&self) -> bool {
        self.approved >= self.required
    }

    /// Additional allowance needed to cover `required`
    pub fn deficit(&self) -> U256 {
        self.required.saturating_sub(self.approved)
    }
}

/// Constants
pub mod constants {
    use alloy_primitives::U256;

    /// Decimal precision of the chain-native currency
    pub const NATIVE_DECIMALS: u8 = 18;

    /// On-chain sentinel for "unlimited keys" (all-ones uint256)
    pub const UNLIMITED_KEYS_SENTINEL: U256 = U256::MAX;
}
