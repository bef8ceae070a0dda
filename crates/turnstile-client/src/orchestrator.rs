//! Transaction construction, submission, and lifecycle tracking
//!
//! Write operations flow through one pipeline: resolve the target's
//! version, convert human amounts to base units with exact integer
//! arithmetic, run the allowance/approval choreography when the spend is
//! ERC20-denominated, encode against the version's operation table, then
//! sign and broadcast. Confirmation tracking polls the receipt until the
//! caller's threshold is met or the wait budget runs out.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use evm_provider::{CallData, TransactionRequest};
use lock_abi::{registry, EventHooks, OperationRequest, ProtocolVersion};
use turnstile_core::{
    constants, units, Currency, Error, MaxKeys, OperationKind, TransactionHandle, TxError,
    TxStatus, VersionError, VersionTag,
};

use crate::events::ClientEvent;
use crate::{receipt, LockClient};

/// Fixed gas limits per operation kind. Lock deployment is an order of
/// magnitude heavier than any other write.
pub(crate) mod gas {
    pub const CREATE_LOCK: u64 = 3_000_000;
    pub const WRITE: u64 = 1_000_000;
    pub const APPROVE: u64 = 100_000;
}

/// Deploy a new lock through a factory contract
#[derive(Debug, Clone)]
pub struct CreateLockRequest {
    pub factory: Address,
    pub name: String,
    /// Key validity duration in seconds
    pub expiration_duration: u64,
    /// Human-decimal price in the lock's currency
    pub key_price: String,
    /// ERC20 currency; `None` prices the lock in native currency
    pub currency: Option<Address>,
    pub max_number_of_keys: MaxKeys,
    /// Interface version the factory deploys. Factories do not report a
    /// version; defaults to the newest supported.
    pub version: Option<VersionTag>,
}

/// Purchase one key. Price and currency are read from the lock when not
/// supplied.
#[derive(Debug, Clone)]
pub struct PurchaseKeyRequest {
    pub lock: Address,
    pub recipient: Address,
    pub key_price: Option<String>,
    pub referrer: Option<Address>,
    pub data: Option<Bytes>,
}

/// Grant keys without payment (lock manager only)
#[derive(Debug, Clone)]
pub struct GrantKeysRequest {
    pub lock: Address,
    pub recipients: Vec<Address>,
    /// Unix expiration timestamp per recipient
    pub expiration_timestamps: Vec<u64>,
    /// Optional per-recipient key managers (v7+); zero-filled when empty
    pub key_managers: Vec<Address>,
}

/// Move funds from the lock to its beneficiary
#[derive(Debug, Clone)]
pub struct WithdrawRequest {
    pub lock: Address,
    /// Human-decimal amount; `None` withdraws the full balance
    pub amount: Option<String>,
}

/// Change the key price (and, on v7+, the pricing currency)
#[derive(Debug, Clone)]
pub struct SetKeyPriceRequest {
    pub lock: Address,
    pub key_price: String,
    /// New ERC20 currency; `None` keeps the lock's current currency
    pub currency: Option<Address>,
}

impl LockClient {
    pub async fn create_lock(&self, request: CreateLockRequest) -> crate::Result<TransactionHandle> {
        let version = match request.version {
            Some(tag) => registry().get(tag).ok_or(Error::Version(VersionError::UnknownTag {
                address: request.factory,
                tag: tag.as_u16(),
            }))?,
            None => registry().newest(),
        };

        let decimals = match request.currency {
            Some(token) => self.inner.erc20.decimals(token).await?,
            None => constants::NATIVE_DECIMALS,
        };
        let key_price = units::to_base_units(&request.key_price, decimals)?;

        let op = OperationRequest::CreateLock {
            expiration_duration: U256::from(request.expiration_duration),
            token_address: request.currency.unwrap_or(Address::ZERO),
            key_price,
            max_number_of_keys: request.max_number_of_keys.to_raw(),
            name: request.name,
        };
        self.submit(request.factory, version, op, U256::ZERO, gas::CREATE_LOCK)
            .await
    }

    pub async fn purchase_key(
        &self,
        request: PurchaseKeyRequest,
    ) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(request.lock).await?;
        let currency = self.currency_of(request.lock, version).await?;
        let amount = self
            .resolve_amount(request.lock, version, request.key_price.as_deref(), &currency)
            .await?;

        if let Currency::Token(info) = &currency {
            self.ensure_allowance(info.address, request.lock, amount)
                .await?;
        }

        let op = OperationRequest::PurchaseKey {
            value: amount,
            recipient: request.recipient,
            referrer: request.referrer.unwrap_or(Address::ZERO),
            data: request.data.unwrap_or_default(),
        };
        // Native value rides on the transaction; ERC20 value rides in
        // the calldata
        let value = if currency.is_native() { amount } else { U256::ZERO };
        self.submit(request.lock, version, op, value, gas::WRITE)
            .await
    }

    pub async fn grant_keys(&self, request: GrantKeysRequest) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(request.lock).await?;
        let op = OperationRequest::GrantKeys {
            recipients: request.recipients,
            expiration_timestamps: request
                .expiration_timestamps
                .into_iter()
                .map(U256::from)
                .collect(),
            key_managers: request.key_managers,
        };
        self.submit(request.lock, version, op, U256::ZERO, gas::WRITE)
            .await
    }

    pub async fn withdraw(&self, request: WithdrawRequest) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(request.lock).await?;
        let currency = self.currency_of(request.lock, version).await?;
        let amount = match &request.amount {
            Some(amount) => units::to_base_units(amount, currency.decimals())?,
            // Contract-side convention: zero withdraws everything
            None => U256::ZERO,
        };
        let op = OperationRequest::Withdraw {
            token_address: currency.token_address().unwrap_or(Address::ZERO),
            amount,
        };
        self.submit(request.lock, version, op, U256::ZERO, gas::WRITE)
            .await
    }

    pub async fn set_key_price(
        &self,
        request: SetKeyPriceRequest,
    ) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(request.lock).await?;
        // The price is denominated in the currency it will be charged in
        let (decimals, token_address) = match request.currency {
            Some(token) => (self.inner.erc20.decimals(token).await?, token),
            None => {
                let current = self.currency_of(request.lock, version).await?;
                (
                    current.decimals(),
                    current.token_address().unwrap_or(Address::ZERO),
                )
            }
        };
        let op = OperationRequest::SetKeyPrice {
            key_price: units::to_base_units(&request.key_price, decimals)?,
            token_address,
        };
        self.submit(request.lock, version, op, U256::ZERO, gas::WRITE)
            .await
    }

    pub async fn set_expiration_duration(
        &self,
        lock: Address,
        seconds: u64,
    ) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(lock).await?;
        let op = OperationRequest::SetExpirationDuration {
            duration: U256::from(seconds),
        };
        self.submit(lock, version, op, U256::ZERO, gas::WRITE).await
    }

    pub async fn set_max_keys(
        &self,
        lock: Address,
        max_number_of_keys: MaxKeys,
    ) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(lock).await?;
        let op = OperationRequest::SetMaxKeys {
            max_number_of_keys: max_number_of_keys.to_raw(),
        };
        self.submit(lock, version, op, U256::ZERO, gas::WRITE).await
    }

    pub async fn set_base_uri(
        &self,
        lock: Address,
        base_token_uri: String,
    ) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(lock).await?;
        let op = OperationRequest::SetBaseUri { base_token_uri };
        self.submit(lock, version, op, U256::ZERO, gas::WRITE).await
    }

    pub async fn set_event_hooks(
        &self,
        lock: Address,
        hooks: EventHooks,
    ) -> crate::Result<TransactionHandle> {
        let version = self.inner.resolver.resolve(lock).await?;
        let op = OperationRequest::SetEventHooks { hooks };
        self.submit(lock, version, op, U256::ZERO, gas::WRITE).await
    }

    /// Track a transaction until it is `Confirmed` (per the configured
    /// threshold) or `Failed`, using the configured wait budget
    pub async fn await_confirmation(
        &self,
        handle: TransactionHandle,
    ) -> crate::Result<TransactionHandle> {
        self.await_confirmation_with(
            handle,
            self.inner.config.required_confirmations,
            self.inner.config.confirmation_timeout(),
        )
        .await
    }

    /// Like [`await_confirmation`](Self::await_confirmation) with an
    /// explicit threshold and wait budget.
    ///
    /// A revert surfaces as `ExecutionReverted` after the failed handle
    /// is pushed to the event stream. Running out of budget is NOT an
    /// error: the transaction may still confirm later, so the handle
    /// comes back with its current (non-terminal) status and the
    /// timeout is reported on the event stream.
    pub async fn await_confirmation_with(
        &self,
        mut handle: TransactionHandle,
        required_confirmations: u64,
        timeout: Option<Duration>,
    ) -> crate::Result<TransactionHandle> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);

        loop {
            match self.inner.provider.receipt(handle.hash).await? {
                None => {
                    // Broadcast but not mined
                    if handle.status == TxStatus::Submitted {
                        handle.status = TxStatus::Pending;
                        self.emit_tx(&handle);
                    }
                }
                Some(receipt) if !receipt.status => {
                    handle.status = TxStatus::Failed;
                    handle.failure = receipt.revert_reason.clone();
                    self.emit_tx(&handle);
                    let err = TxError::ExecutionReverted {
                        hash: handle.hash,
                        reason: receipt.revert_reason,
                    };
                    self.inner.events.emit(ClientEvent::Error {
                        operation: Some(handle.operation),
                        message: err.to_string(),
                    });
                    return Err(err.into());
                }
                Some(receipt) => {
                    let head = self.inner.provider.block_number().await?;
                    handle.confirmations = head.saturating_sub(receipt.block_number) + 1;
                    if handle.status != TxStatus::Mined {
                        handle.status = TxStatus::Mined;
                        self.emit_tx(&handle);
                    }
                    if handle.confirmations >= required_confirmations {
                        handle.status = TxStatus::Confirmed;
                        handle.outcome = self.derive_outcome(&handle, &receipt);
                        self.emit_tx(&handle);
                        return Ok(handle);
                    }
                }
            }

            match deadline {
                Some(deadline) => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        let signal = TxError::ConfirmationTimeout {
                            hash: handle.hash,
                            confirmations: handle.confirmations,
                            required: required_confirmations,
                        };
                        tracing::debug!(hash = %handle.hash, "{signal}");
                        self.inner.events.emit(ClientEvent::Error {
                            operation: Some(handle.operation),
                            message: signal.to_string(),
                        });
                        return Ok(handle);
                    }
                    let next_poll = now + self.inner.config.poll_interval();
                    tokio::time::sleep_until(next_poll.min(deadline)).await;
                }
                None => tokio::time::sleep(self.inner.config.poll_interval()).await,
            }
        }
    }

    /// Encode, sign, broadcast, and hand back a `Submitted` handle
    pub(crate) async fn submit(
        &self,
        target: Address,
        version: &ProtocolVersion,
        op: OperationRequest,
        native_value: U256,
        gas_limit: u64,
    ) -> crate::Result<TransactionHandle> {
        let data = version.encode(&op)?;
        let call = CallData::new(target, data).with_value(native_value);
        let handle = self
            .broadcast(call, op.kind(), target, Some(version.tag()), gas_limit)
            .await?;
        self.emit_tx(&handle);
        Ok(handle)
    }

    async fn broadcast(
        &self,
        call: CallData,
        operation: OperationKind,
        contract: Address,
        version: Option<VersionTag>,
        gas_limit: u64,
    ) -> crate::Result<TransactionHandle> {
        let request = TransactionRequest::from_call(self.inner.signer.address(), call, gas_limit);
        let signed = self.inner.signer.sign_transaction(&request).await?;
        let hash = self.inner.provider.send_transaction(signed).await?;
        tracing::debug!(%hash, %operation, %contract, "transaction broadcast");

        let mut handle = TransactionHandle::submitted(hash, operation, contract);
        handle.version = version;
        Ok(handle)
    }

    /// Price to spend, in base units: the caller's quote when given,
    /// else the lock's current price
    async fn resolve_amount(
        &self,
        lock: Address,
        version: &ProtocolVersion,
        key_price: Option<&str>,
        currency: &Currency,
    ) -> crate::Result<U256> {
        match key_price {
            Some(price) => Ok(units::to_base_units(price, currency.decimals())?),
            None => self.view_uint(lock, &version.views().key_price).await,
        }
    }

    /// Make sure `spender` may move `required` of `token` for the signer
    /// before the dependent spend is broadcast. The lock checks
    /// allowance at execution time, so the approval must be mined first;
    /// this blocks until it is.
    pub(crate) async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        required: U256,
    ) -> crate::Result<()> {
        let owner = self.inner.signer.address();
        let state = self
            .inner
            .erc20
            .approval_state(token, owner, spender, required)
            .await?;
        if state.is_sufficient() {
            return Ok(());
        }

        tracing::debug!(
            %token, %spender, required = %required, approved = %state.approved,
            "allowance insufficient, submitting approval"
        );
        let call = self.inner.erc20.build_approve(token, spender, required);
        let mut handle = self
            .broadcast(call, OperationKind::Approve, token, None, gas::APPROVE)
            .await?;
        self.emit_tx(&handle);

        match self.wait_for_receipt(handle.hash).await? {
            Some(receipt) if receipt.status => {
                handle.status = TxStatus::Mined;
                handle.confirmations = 1;
                self.emit_tx(&handle);
                Ok(())
            }
            Some(receipt) => {
                handle.status = TxStatus::Failed;
                handle.failure = receipt.revert_reason.clone();
                self.emit_tx(&handle);
                let err = TxError::ApprovalFailed {
                    hash: handle.hash,
                    reason: receipt.revert_reason,
                };
                self.inner.events.emit(ClientEvent::Error {
                    operation: Some(OperationKind::Approve),
                    message: err.to_string(),
                });
                Err(err.into())
            }
            None => {
                let err = TxError::ConfirmationTimeout {
                    hash: handle.hash,
                    confirmations: 0,
                    required: 1,
                };
                self.inner.events.emit(ClientEvent::Error {
                    operation: Some(OperationKind::Approve),
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Poll until the receipt shows up or the configured wait budget
    /// runs out (`None` on timeout)
    async fn wait_for_receipt(
        &self,
        hash: alloy_primitives::B256,
    ) -> crate::Result<Option<evm_provider::TransactionReceipt>> {
        let deadline = self
            .inner
            .config
            .confirmation_timeout()
            .map(|t| tokio::time::Instant::now() + t);

        loop {
            if let Some(receipt) = self.inner.provider.receipt(hash).await? {
                return Ok(Some(receipt));
            }
            match deadline {
                Some(deadline) => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    let next_poll = now + self.inner.config.poll_interval();
                    tokio::time::sleep_until(next_poll.min(deadline)).await;
                }
                None => tokio::time::sleep(self.inner.config.poll_interval()).await,
            }
        }
    }

    fn derive_outcome(
        &self,
        handle: &TransactionHandle,
        receipt: &evm_provider::TransactionReceipt,
    ) -> Option<turnstile_core::OperationOutcome> {
        let version = registry().get(handle.version?)?;
        receipt::extract_outcome(handle.operation, receipt, version, handle.contract)
    }

    pub(crate) fn emit_tx(&self, handle: &TransactionHandle) {
        self.inner.events.emit(ClientEvent::TransactionUpdated {
            handle: handle.clone(),
        });
    }
}
