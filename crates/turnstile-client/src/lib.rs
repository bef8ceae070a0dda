//! turnstile-client: one stable API over every lock interface generation
//!
//! A [`LockClient`] resolves the protocol version a contract implements,
//! routes reads and writes through the version's dispatch table, drives
//! transactions from construction to confirmed-or-failed, and decodes
//! structured results out of receipts. ERC20-priced operations get their
//! allowance checked and approved automatically before the spend.
//!
//! # Example
//!
//! ```ignore
//! use turnstile_client::{LockClient, PurchaseKeyRequest};
//!
//! let client = LockClient::new(provider, signer, ClientConfig::default());
//! let handle = client
//!     .purchase_key(PurchaseKeyRequest {
//!         lock,
//!         recipient,
//!         key_price: None, // read from the lock
//!         referrer: None,
//!         data: None,
//!     })
//!     .await?;
//! let handle = client.await_confirmation(handle).await?;
//! ```

pub mod batch;
pub mod events;
pub mod orchestrator;
pub mod reader;
pub mod receipt;

#[cfg(test)]
pub(crate) mod testutil;

use std::sync::Arc;

use alloy_primitives::Address;
use evm_provider::{Provider, Signer};
use evm_erc20::Erc20Adapter;
use lock_abi::VersionResolver;
use tokio::sync::broadcast;

pub use batch::{BatchPurchaseRequest, PurchaseEntry, PurchaseOutcome};
pub use events::ClientEvent;
pub use lock_abi::{EventHooks, EventKind, EventRecord, FieldValue};
pub use orchestrator::{
    CreateLockRequest, GrantKeysRequest, PurchaseKeyRequest, SetKeyPriceRequest, WithdrawRequest,
};
pub use receipt::decode_event;
pub use turnstile_core::{
    ClientConfig, Currency, Error, KeySnapshot, LockSnapshot, MaxKeys, OperationKind,
    OperationOutcome, Result, TokenInfo, TransactionHandle, TxStatus, VersionTag,
};

/// The lock client. Cheap to clone; all clones share the same caches and
/// event stream.
#[derive(Clone)]
pub struct LockClient {
    inner: Arc<ClientInner>,
}

/// Client-owned state. The resolver's per-address version cache and the
/// token decimals cache live here for the client's lifetime; both are
/// append-only maps keyed by immutable chain facts.
pub(crate) struct ClientInner {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) signer: Arc<dyn Signer>,
    pub(crate) config: ClientConfig,
    pub(crate) resolver: VersionResolver,
    pub(crate) erc20: Erc20Adapter,
    pub(crate) events: events::EventBus,
}

impl LockClient {
    pub fn new(provider: Arc<dyn Provider>, signer: Arc<dyn Signer>, config: ClientConfig) -> Self {
        let resolver = match &config.probe_order {
            Some(order) => VersionResolver::new(provider.clone()).with_probe_order(order.clone()),
            None => VersionResolver::new(provider.clone()),
        };
        let erc20 = Erc20Adapter::new(provider.clone());
        let events = events::EventBus::new(config.event_buffer);

        Self {
            inner: Arc::new(ClientInner {
                provider,
                signer,
                config,
                resolver,
                erc20,
                events,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The account write operations are sent from
    pub fn account(&self) -> Address {
        self.inner.signer.address()
    }

    /// Subscribe to lifecycle events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Resolve (and cache) the protocol version a contract implements
    pub async fn resolve_version(&self, contract: Address) -> Result<VersionTag> {
        Ok(self.inner.resolver.resolve(contract).await?.tag())
    }
}
