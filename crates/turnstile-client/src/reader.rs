//! Read-only lock accessors
//!
//! Fetches the attribute set the resolved version exposes and normalizes
//! it into a version-independent [`LockSnapshot`]. Amounts come back in
//! human-decimal form; the capacity sentinel never leaks. Snapshots are
//! built fresh on every call, since on-chain state moves, and the
//! `as_of` block lets callers detect staleness.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use lock_abi::{ProtocolVersion, ViewFn};
use turnstile_core::{
    constants, units, Currency, Error, KeySnapshot, LockSnapshot, MaxKeys, ReadError, TokenInfo,
};

use crate::events::ClientEvent;
use crate::LockClient;

impl LockClient {
    /// Read a lock's current state, normalized across versions.
    ///
    /// Any underlying failure surfaces as `LockReadFailed`; no partial
    /// snapshot is ever returned.
    pub async fn read_lock(&self, lock: Address) -> crate::Result<LockSnapshot> {
        let version = self.inner.resolver.resolve(lock).await?;
        let snapshot = self.read_lock_with(lock, version).await?;
        self.inner.events.emit(ClientEvent::LockUpdated {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    pub(crate) async fn read_lock_with(
        &self,
        lock: Address,
        version: &ProtocolVersion,
    ) -> crate::Result<LockSnapshot> {
        let views = version.views();

        let as_of = self
            .inner
            .provider
            .block_number()
            .await
            .map_err(|e| read_failed(lock, e))?;

        let key_price_raw = self.view_uint(lock, &views.key_price).await?;
        let expiration_duration = self
            .view_uint(lock, &views.expiration_duration)
            .await?
            .saturating_to::<u64>();
        let max_raw = self.view_uint(lock, &views.max_number_of_keys).await?;
        let outstanding_keys = self
            .view_uint(lock, &views.outstanding_keys)
            .await?
            .saturating_to::<u64>();
        let owner = self.view_address(lock, &views.owner).await?;

        let beneficiary = match &views.beneficiary {
            Some(view) => self.view_address(lock, view).await?,
            None => owner,
        };
        let base_token_uri = match &views.base_token_uri {
            Some(view) => Some(self.view_string(lock, view).await?),
            None => None,
        };
        let max_keys_per_address = match &views.max_keys_per_address {
            Some(view) => Some(self.view_uint(lock, view).await?.saturating_to::<u64>()),
            None => None,
        };

        let currency = self.currency_of(lock, version).await?;
        let balance_raw = match &currency {
            Currency::Native => self
                .inner
                .provider
                .balance(lock)
                .await
                .map_err(|e| read_failed(lock, e))?,
            Currency::Token(info) => self.inner.erc20.balance_of(info.address, lock).await?,
        };

        let decimals = currency.decimals();
        Ok(LockSnapshot {
            address: lock,
            key_price: units::from_base_units(key_price_raw, decimals),
            currency,
            expiration_duration,
            max_number_of_keys: MaxKeys::from_raw(max_raw),
            outstanding_keys,
            owner,
            beneficiary,
            base_token_uri,
            max_keys_per_address,
            balance: units::from_base_units(balance_raw, decimals),
            as_of,
        })
    }

    /// The currency a lock is priced in. Versions without a currency
    /// view, and locks reporting the zero address, are native.
    pub(crate) async fn currency_of(
        &self,
        lock: Address,
        version: &ProtocolVersion,
    ) -> crate::Result<Currency> {
        let Some(view) = &version.views().token_address else {
            return Ok(Currency::Native);
        };
        let token = self.view_address(lock, view).await?;
        if token == Address::ZERO {
            return Ok(Currency::Native);
        }
        let decimals = self.inner.erc20.decimals(token).await?;
        let symbol = self.inner.erc20.symbol(token).await?;
        Ok(Currency::Token(TokenInfo {
            address: token,
            symbol,
            decimals,
        }))
    }

    /// Key expiration for `owner` on `lock`. An owner without a key (or
    /// a lock that cannot answer) reads as expiration 0.
    pub async fn read_key(&self, lock: Address, owner: Address) -> crate::Result<KeySnapshot> {
        let version = self.inner.resolver.resolve(lock).await?;
        let data = version.views().key_expiration.calldata_address(owner);

        let expiration = match self.inner.provider.call(lock, data).await {
            Ok(ret) => U256::abi_decode(&ret, true)
                .map(|v| v.saturating_to::<u64>())
                .unwrap_or(0),
            Err(e) => {
                tracing::debug!(%lock, %owner, error = %e, "key expiration unreadable, treating as no key");
                0
            }
        };

        Ok(KeySnapshot {
            lock,
            owner,
            expiration,
        })
    }

    /// Native-currency balance of any address, in decimal form
    pub async fn account_balance(&self, address: Address) -> crate::Result<String> {
        let raw = self.inner.provider.balance(address).await?;
        Ok(units::from_base_units(raw, constants::NATIVE_DECIMALS))
    }

    pub(crate) async fn view_uint(&self, lock: Address, view: &ViewFn) -> crate::Result<U256> {
        let ret = self
            .inner
            .provider
            .call(lock, view.calldata())
            .await
            .map_err(|e| read_failed(lock, e))?;
        U256::abi_decode(&ret, true).map_err(|e| read_failed(lock, e))
    }

    async fn view_address(&self, lock: Address, view: &ViewFn) -> crate::Result<Address> {
        let ret = self
            .inner
            .provider
            .call(lock, view.calldata())
            .await
            .map_err(|e| read_failed(lock, e))?;
        Address::abi_decode(&ret, true).map_err(|e| read_failed(lock, e))
    }

    async fn view_string(&self, lock: Address, view: &ViewFn) -> crate::Result<String> {
        let ret = self
            .inner
            .provider
            .call(lock, view.calldata())
            .await
            .map_err(|e| read_failed(lock, e))?;
        String::abi_decode(&ret, true).map_err(|e| read_failed(lock, e))
    }
}

fn read_failed(lock: Address, e: impl std::fmt::Display) -> Error {
    ReadError::LockReadFailed {
        address: lock,
        message: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use evm_provider::mock::MockProvider;
    use lock_abi::registry;
    use turnstile_core::VersionTag;

    use super::*;
    use crate::testutil::{fast_client, lock_address, script_v9_token_lock};

    fn client(provider: Arc<MockProvider>) -> LockClient {
        fast_client(provider).0
    }

    #[tokio::test]
    async fn snapshot_normalizes_token_lock() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);
        provider.set_block_number(4_200);

        let snapshot = client(provider).read_lock(lock_address()).await.unwrap();

        assert_eq!(snapshot.key_price, "5");
        assert_eq!(snapshot.balance, "60");
        assert_eq!(snapshot.max_number_of_keys, MaxKeys::Unlimited);
        assert_eq!(snapshot.outstanding_keys, 12);
        assert_eq!(snapshot.owner, Address::repeat_byte(0x99));
        assert_eq!(snapshot.beneficiary, Address::repeat_byte(0x98));
        assert_eq!(snapshot.base_token_uri.as_deref(), Some("ipfs://locks/"));
        assert_eq!(snapshot.max_keys_per_address, Some(1));
        assert_eq!(snapshot.as_of, 4_200);
        match &snapshot.currency {
            Currency::Token(info) => {
                assert_eq!(info.symbol, "USDC");
                assert_eq!(info.decimals, 6);
            }
            Currency::Native => panic!("expected token currency"),
        }
    }

    #[tokio::test]
    async fn snapshot_price_round_trips_to_base_units() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);

        let snapshot = client(provider).read_lock(lock_address()).await.unwrap();
        let raw = units::to_base_units(&snapshot.key_price, snapshot.currency.decimals()).unwrap();
        assert_eq!(raw, U256::from(5_000_000u64));
    }

    #[tokio::test]
    async fn failed_view_read_is_lock_read_failed() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);
        let views = registry().get(VersionTag::new(9)).unwrap().views();
        provider.respond_revert(lock_address(), views.key_price.selector());

        let err = client(provider).read_lock(lock_address()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Read(ReadError::LockReadFailed { address, .. }) if address == lock_address()
        ));
    }

    #[tokio::test]
    async fn read_emits_lock_updated() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);

        let client = client(provider);
        let mut events = client.subscribe();
        client.read_lock(lock_address()).await.unwrap();

        match events.try_recv().unwrap() {
            ClientEvent::LockUpdated { snapshot } => assert_eq!(snapshot.address, lock_address()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_key_reads_as_expiration_zero() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);

        let key = client(provider)
            .read_key(lock_address(), Address::repeat_byte(0x77))
            .await
            .unwrap();
        assert_eq!(key.expiration, 0);
        assert!(!key.is_valid_at(1));
    }

    #[tokio::test]
    async fn account_balance_is_decimal_ether() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);
        let holder = Address::repeat_byte(0x31);
        provider.set_balance(holder, U256::from(10_000_000_000_000_000u64)); // 0.01

        assert_eq!(
            client(provider).account_balance(holder).await.unwrap(),
            "0.01"
        );
    }
}
