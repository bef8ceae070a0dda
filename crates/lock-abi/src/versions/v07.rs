//! v7: value-carrying `purchase`, currency-aware pricing and withdrawal
//!
//! The purchase call gains the ERC20 amount, a referrer, and an opaque
//! data blob; the price update call takes the new currency alongside the
//! new price; withdrawal names the token being withdrawn.

use alloy_primitives::{Bytes, B256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use turnstile_core::{OperationKind, ReadError, TxError};

use crate::events::{EventKind, FieldValue};
use crate::ops::{mismatch, OperationRequest};
use crate::registry::{EventCodec, OpCodec, TableBuilder};

sol! {
    function purchase(uint256 _value, address _recipient, address _referrer, bytes _data) external payable;
    function updateKeyPricing(uint256 _keyPrice, address _tokenAddress) external;
    function withdraw(address _tokenAddress, uint256 _amount) external;
    function grantKeys(address[] _recipients, uint256[] _expirationTimestamps, address[] _keyManagers) external;

    event PricingChanged(uint256 oldKeyPrice, uint256 keyPrice, address oldTokenAddress, address tokenAddress);
    event Withdrawal(address indexed sender, address indexed tokenAddress, address indexed beneficiary, uint256 amount);
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.ops.insert(
        OperationKind::PurchaseKey,
        OpCodec {
            selector: purchaseCall::SELECTOR,
            encode: encode_purchase,
        },
    );
    table.ops.insert(
        OperationKind::SetKeyPrice,
        OpCodec {
            selector: updateKeyPricingCall::SELECTOR,
            encode: encode_set_key_price,
        },
    );
    table.ops.insert(
        OperationKind::Withdraw,
        OpCodec {
            selector: withdrawCall::SELECTOR,
            encode: encode_withdraw,
        },
    );
    table.ops.insert(
        OperationKind::GrantKeys,
        OpCodec {
            selector: grantKeysCall::SELECTOR,
            encode: encode_grant_keys,
        },
    );

    table.events.insert(
        EventKind::PriceChanged,
        EventCodec {
            name: "PricingChanged",
            topic: PricingChanged::SIGNATURE_HASH,
            decode: decode_pricing_changed,
        },
    );
    table.events.insert(
        EventKind::Withdrawal,
        EventCodec {
            name: "Withdrawal",
            topic: Withdrawal::SIGNATURE_HASH,
            decode: decode_withdrawal,
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
            _value: *value,
            _recipient: *recipient,
            _referrer: *referrer,
            _data: data.to_vec(),
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_set_key_price(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetKeyPrice {
            key_price,
            token_address,
        } => Ok(updateKeyPricingCall {
            _keyPrice: *key_price,
            _tokenAddress: *token_address,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_withdraw(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::Withdraw {
            token_address,
            amount,
        } => Ok(withdrawCall {
            _tokenAddress: *token_address,
            _amount: *amount,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_grant_keys(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::GrantKeys {
            recipients,
            expiration_timestamps,
            key_managers,
        } => {
            // Contracts require the manager array to match recipients;
            // absent managers default to the zero address
            let managers = if key_managers.is_empty() {
                vec![alloy_primitives::Address::ZERO; recipients.len()]
            } else {
                key_managers.clone()
            };
            Ok(grantKeysCall {
                _recipients: recipients.clone(),
                _expirationTimestamps: expiration_timestamps.clone(),
                _keyManagers: managers,
            }
            .abi_encode()
            .into())
        }
        other => Err(mismatch(other)),
    }
}

fn decode_err(e: impl std::fmt::Display) -> ReadError {
    ReadError::DecodeFailed {
        message: e.to_string(),
    }
}

fn decode_pricing_changed(topics: &[B256], data: &[u8]) -> Result<Vec<FieldValue>, ReadError> {
    let ev = PricingChanged::decode_raw_log(topics.iter().copied(), data, true).map_err(decode_err)?;
    Ok(vec![
        FieldValue::Uint(ev.oldKeyPrice),
        FieldValue::Uint(ev.keyPrice),
        FieldValue::Address(ev.oldTokenAddress),
        FieldValue::Address(ev.tokenAddress),
    ])
}

fn decode_withdrawal(topics: &[B256], data: &[u8]) -> Result<Vec<FieldValue>, ReadError> {
    let ev = Withdrawal::decode_raw_log(topics.iter().copied(), data, true).map_err(decode_err)?;
    Ok(vec![
        FieldValue::Address(ev.sender),
        FieldValue::Address(ev.tokenAddress),
        FieldValue::Address(ev.beneficiary),
        FieldValue::Uint(ev.amount),
    ])
}
