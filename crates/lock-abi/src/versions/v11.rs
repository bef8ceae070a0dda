//! v11: multi-recipient purchase
//!
//! The purchase call takes parallel arrays. A single-recipient request
//! encodes as one-element arrays; the batch coordinator keeps issuing
//! independent transactions for v10 and below.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall};
use turnstile_core::{OperationKind, TxError};

use crate::ops::{mismatch, OperationRequest};
use crate::registry::{OpCodec, TableBuilder};

sol! {
    function purchase(uint256[] _values, address[] _recipients, address[] _referrers, address[] _keyManagers, bytes[] _data) external payable returns (uint256[]);
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.ops.insert(
        OperationKind::PurchaseKey,
        OpCodec {
            selector: purchaseCall::SELECTOR,
            encode: encode_purchase,
        },
    );
}

fn encode_purchase(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::PurchaseKey {
            value,
            recipient,
            referrer,
            data,
        } => Ok(purchaseCall {
            _values: vec![*value],
            _recipients: vec![*recipient],
            _referrers: vec![*referrer],
            _keyManagers: vec![Address::ZERO],
            _data: vec![data.to_vec()],
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}
