//! Protocol version resolution
//!
//! Locks report their version through `publicLockVersion()` from v3 on.
//! Contracts that predate the accessor are identified structurally:
//! probe each candidate version's distinguishing view selectors and take
//! the first whose probes all answer. The probe order is policy (newest
//! to oldest by default); only "first full match wins" is relied upon.
//!
//! Results are cached per address for the process lifetime and never
//! invalidated: a deployed contract's version is immutable.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use evm_provider::Provider;
use tokio::sync::RwLock;
use turnstile_core::{Error, ProviderError, VersionError, VersionTag};

use crate::registry::{registry, ProtocolVersion};
use crate::versions::v03::publicLockVersionCall;

/// Selector of the version-reporting accessor (`publicLockVersion()`)
pub fn accessor_selector() -> [u8; 4] {
    publicLockVersionCall::SELECTOR
}

pub struct VersionResolver {
    provider: Arc<dyn Provider>,
    cache: RwLock<HashMap<Address, VersionTag>>,
    probe_order: Option<Vec<VersionTag>>,
}

impl VersionResolver {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
            probe_order: None,
        }
    }

    /// Override the fallback probe order
    pub fn with_probe_order(mut self, order: Vec<VersionTag>) -> Self {
        self.probe_order = Some(order);
        self
    }

    /// Resolve the protocol version a contract implements
    pub async fn resolve(&self, address: Address) -> Result<&'static ProtocolVersion, Error> {
        if let Some(tag) = self.cache.read().await.get(&address).copied() {
            if let Some(version) = registry().get(tag) {
                return Ok(version);
            }
        }

        let version = self.resolve_uncached(address).await?;
        self.cache
            .write()
            .await
            .entry(address)
            .or_insert(version.tag());
        Ok(version)
    }

    async fn resolve_uncached(&self, address: Address) -> Result<&'static ProtocolVersion, Error> {
        // 1. The version accessor, when present, is authoritative
        let accessor = publicLockVersionCall {}.abi_encode();
        match self.provider.call(address, accessor.into()).await {
            Ok(ret) => {
                if let Ok(decoded) = publicLockVersionCall::abi_decode_returns(&ret, true) {
                    let tag = decoded._0.saturating_to::<u16>();
                    return registry()
                        .get(VersionTag::new(tag))
                        .ok_or_else(|| VersionError::UnknownTag { address, tag }.into());
                }
                tracing::debug!(%address, "version accessor answer undecodable, probing selectors");
            }
            Err(ProviderError::Rpc { .. }) => {
                // Contracts older than v3 have no accessor
                tracing::debug!(%address, "no version accessor, probing selectors");
            }
            Err(other) => return Err(other.into()),
        }

        // 2. Structural probing
        let candidates: Vec<&'static ProtocolVersion> = match &self.probe_order {
            Some(order) => order.iter().filter_map(|tag| registry().get(*tag)).collect(),
            None => registry().newest_first().collect(),
        };
        for version in candidates {
            if self.probe_matches(address, version).await? {
                tracing::debug!(%address, version = %version.tag(), "resolved by structural probe");
                return Ok(version);
            }
        }

        Err(VersionError::Unresolved { address }.into())
    }

    /// A version matches when every probe selector answers
    async fn probe_matches(
        &self,
        address: Address,
        version: &ProtocolVersion,
    ) -> Result<bool, Error> {
        for selector in version.probe_selectors() {
            match self.provider.call(address, selector.to_vec().into()).await {
                Ok(_) => continue,
                Err(ProviderError::Rpc { .. }) => return Ok(false),
                Err(other) => return Err(other.into()),
            }
        }
        Ok(true)
    }
}
