//! Batch key purchases
//!
//! Versions through v10 sell to a single recipient per call, so a batch
//! is one shared approval plus N independent purchase transactions. The
//! approval covers the aggregate spend exactly; each purchase then rides
//! on it without re-approving. Purchases run concurrently and fail in
//! isolation: on-chain they are unrelated transactions, so one revert
//! neither cancels nor rolls back the rest.

use alloy_primitives::{Address, Bytes, U256};
use futures::future::join_all;
use lock_abi::OperationRequest;
use turnstile_core::{units, Currency, TransactionHandle, UnitError};

use crate::orchestrator::gas;
use crate::LockClient;

/// One requested purchase within a batch
#[derive(Debug, Clone)]
pub struct PurchaseEntry {
    pub recipient: Address,
    /// Read from the lock when omitted
    pub key_price: Option<String>,
    pub referrer: Option<Address>,
    pub data: Option<Bytes>,
}

/// A batch of purchases against one lock
#[derive(Debug, Clone)]
pub struct BatchPurchaseRequest {
    pub lock: Address,
    pub purchases: Vec<PurchaseEntry>,
}

/// Per-purchase result; errors are isolated to their own entry
#[derive(Debug)]
pub struct PurchaseOutcome {
    pub recipient: Address,
    pub result: crate::Result<TransactionHandle>,
}

impl LockClient {
    /// Purchase keys for many recipients: exactly one approval sized to
    /// the sum of all prices, then one transaction per purchase,
    /// submitted concurrently and confirmed independently.
    pub async fn purchase_many(
        &self,
        request: BatchPurchaseRequest,
    ) -> crate::Result<Vec<PurchaseOutcome>> {
        if request.purchases.is_empty() {
            return Ok(Vec::new());
        }

        let lock = request.lock;
        let version = self.inner.resolver.resolve(lock).await?;
        let currency = self.currency_of(lock, version).await?;

        // Per-purchase base-unit amounts; the lock's current price is
        // fetched once and reused for entries without a quote
        let mut listed_price = None;
        let mut amounts = Vec::with_capacity(request.purchases.len());
        for entry in &request.purchases {
            let amount = match &entry.key_price {
                Some(price) => units::to_base_units(price, currency.decimals())?,
                None => match listed_price {
                    Some(price) => price,
                    None => {
                        let price = self.view_uint(lock, &version.views().key_price).await?;
                        listed_price = Some(price);
                        price
                    }
                },
            };
            amounts.push(amount);
        }

        if let Currency::Token(info) = &currency {
            let aggregate = amounts
                .iter()
                .try_fold(U256::ZERO, |sum, amount| sum.checked_add(*amount))
                .ok_or(UnitError::Overflow {
                    amount: "aggregate batch price".to_string(),
                    decimals: currency.decimals(),
                })?;
            self.ensure_allowance(info.address, lock, aggregate).await?;
        }

        let tasks = request
            .purchases
            .iter()
            .zip(&amounts)
            .map(|(entry, amount)| {
                let op = OperationRequest::PurchaseKey {
                    value: *amount,
                    recipient: entry.recipient,
                    referrer: entry.referrer.unwrap_or(Address::ZERO),
                    data: entry.data.clone().unwrap_or_default(),
                };
                let value = if currency.is_native() {
                    *amount
                } else {
                    U256::ZERO
                };
                async move {
                    let result = async {
                        let handle = self.submit(lock, version, op, value, gas::WRITE).await?;
                        self.await_confirmation(handle).await
                    }
                    .await;
                    PurchaseOutcome {
                        recipient: entry.recipient,
                        result,
                    }
                }
            });

        Ok(join_all(tasks).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use evm_provider::mock::MockProvider;
    use turnstile_core::{Error, TxError, TxStatus};

    use super::*;
    use crate::testutil::{
        fast_client, lock_address, script_allowance, script_v5_native_lock, script_v9_token_lock,
        token_address,
    };

    fn entry(recipient: Address) -> PurchaseEntry {
        PurchaseEntry {
            recipient,
            key_price: None,
            referrer: None,
            data: None,
        }
    }

    #[tokio::test]
    async fn one_aggregate_approval_then_n_purchases() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);
        script_allowance(&provider, U256::ZERO);
        let (client, signer) = fast_client(provider);

        let outcomes = client
            .purchase_many(BatchPurchaseRequest {
                lock: lock_address(),
                purchases: vec![
                    entry(Address::repeat_byte(0xa1)),
                    entry(Address::repeat_byte(0xa2)),
                    entry(Address::repeat_byte(0xa3)),
                ],
            })
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        for outcome in &outcomes {
            assert!(outcome.result.is_ok());
        }

        let requests = signer.requests();
        assert_eq!(requests.len(), 4, "one approval, three purchases");

        let approvals: Vec<_> = requests
            .iter()
            .filter(|r| r.data.len() >= 4 && r.data[..4] == evm_erc20::selectors::APPROVE)
            .collect();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].to, token_address());

        // Approval precedes every purchase and covers the exact sum of
        // the three 5.00 prices
        assert_eq!(requests[0].to, token_address());
        let aggregate: [u8; 32] = U256::from(15_000_000u64).to_be_bytes();
        assert!(requests[0].data.windows(32).any(|w| w == &aggregate[..]));
    }

    #[tokio::test]
    async fn one_reverting_purchase_does_not_sink_the_rest() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);
        script_allowance(&provider, U256::ZERO);

        let unlucky = Address::repeat_byte(0xa2);
        provider.fail_sends_matching(unlucky.to_vec(), "MAX_KEYS");

        let (client, _signer) = fast_client(provider);
        let outcomes = client
            .purchase_many(BatchPurchaseRequest {
                lock: lock_address(),
                purchases: vec![
                    entry(Address::repeat_byte(0xa1)),
                    entry(unlucky),
                    entry(Address::repeat_byte(0xa3)),
                ],
            })
            .await
            .unwrap();

        for outcome in &outcomes {
            if outcome.recipient == unlucky {
                assert!(matches!(
                    outcome.result,
                    Err(Error::Tx(TxError::ExecutionReverted { .. }))
                ));
            } else {
                let handle = outcome.result.as_ref().unwrap();
                assert_eq!(handle.status, TxStatus::Confirmed);
            }
        }
    }

    #[tokio::test]
    async fn native_batch_needs_no_approval() {
        let provider = Arc::new(MockProvider::new());
        script_v5_native_lock(&provider);
        let (client, signer) = fast_client(provider);

        let outcomes = client
            .purchase_many(BatchPurchaseRequest {
                lock: lock_address(),
                purchases: vec![
                    entry(Address::repeat_byte(0xa1)),
                    entry(Address::repeat_byte(0xa2)),
                ],
            })
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let requests = signer.requests();
        assert_eq!(requests.len(), 2, "no approval transactions");
        // each purchase carries its own native value
        for request in &requests {
            assert_eq!(request.value, U256::from(10_000_000_000_000_000u64));
        }
    }

    #[tokio::test]
    async fn supplied_quotes_override_the_listed_price() {
        let provider = Arc::new(MockProvider::new());
        script_v9_token_lock(&provider);
        // quotes below add up to 7.50; allowance already covers it
        script_allowance(&provider, U256::from(10_000_000u64));
        let (client, signer) = fast_client(provider);

        let outcomes = client
            .purchase_many(BatchPurchaseRequest {
                lock: lock_address(),
                purchases: vec![
                    PurchaseEntry {
                        recipient: Address::repeat_byte(0xa1),
                        key_price: Some("2.50".to_string()),
                        referrer: None,
                        data: None,
                    },
                    PurchaseEntry {
                        recipient: Address::repeat_byte(0xa2),
                        key_price: Some("5".to_string()),
                        referrer: None,
                        data: None,
                    },
                ],
            })
            .await
            .unwrap();

        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        // allowance sufficed: only the two purchases were signed
        assert_eq!(signer.requests().len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let provider = Arc::new(MockProvider::new());
        let (client, signer) = fast_client(provider);

        let outcomes = client
            .purchase_many(BatchPurchaseRequest {
                lock: lock_address(),
                purchases: vec![],
            })
            .await
            .unwrap();
        assert!(outcomes.is_empty());
        assert!(signer.requests().is_empty());
    }
}
