//! v2 base interface
//!
//! The oldest supported generation: native pricing only,
//! single-recipient `purchaseFor`, full-balance `withdraw()`.

use std::collections::HashMap;

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall, SolEvent};
use turnstile_core::{OperationKind, ReadError, TxError};

use crate::events::{EventKind, FieldValue};
use crate::ops::{mismatch, OperationRequest};
use crate::registry::{EventCodec, OpCodec, TableBuilder, ViewFn, ViewSchema};

sol! {
    function keyPrice() external view returns (uint256);
    function expirationDuration() external view returns (uint256);
    function maxNumberOfKeys() external view returns (uint256);
    function numberOfOutstandingKeys() external view returns (uint256);
    function owner() external view returns (address);
    function keyExpirationTimestampFor(address _owner) external view returns (uint256);

    function purchaseFor(address _recipient) external payable;
    function withdraw() external;
    function updateKeyPrice(uint256 _keyPrice) external;
    function createLock(uint256 _expirationDuration, uint256 _keyPrice, uint256 _maxNumberOfKeys) external;

    event NewLock(address indexed lockOwner, address indexed newLockAddress);
    event Transfer(address indexed _from, address indexed _to, uint256 indexed _tokenId);
    event PriceChanged(uint256 oldKeyPrice, uint256 keyPrice);
    event Withdrawal(address indexed beneficiary, uint256 amount);
}

pub(crate) fn base() -> TableBuilder {
    let mut ops = HashMap::new();
    ops.insert(
        OperationKind::CreateLock,
        OpCodec {
            selector: createLockCall::SELECTOR,
            encode: encode_create_lock,
        },
    );
    ops.insert(
        OperationKind::PurchaseKey,
        OpCodec {
            selector: purchaseForCall::SELECTOR,
            encode: encode_purchase,
        },
    );
    ops.insert(
        OperationKind::Withdraw,
        OpCodec {
            selector: withdrawCall::SELECTOR,
            encode: encode_withdraw,
        },
    );
    ops.insert(
        OperationKind::SetKeyPrice,
        OpCodec {
            selector: updateKeyPriceCall::SELECTOR,
            encode: encode_set_key_price,
        },
    );

    let views = ViewSchema {
        key_price: ViewFn::new(keyPriceCall::SELECTOR),
        expiration_duration: ViewFn::new(expirationDurationCall::SELECTOR),
        max_number_of_keys: ViewFn::new(maxNumberOfKeysCall::SELECTOR),
        outstanding_keys: ViewFn::new(numberOfOutstandingKeysCall::SELECTOR),
        owner: ViewFn::new(ownerCall::SELECTOR),
        key_expiration: ViewFn::new(keyExpirationTimestampForCall::SELECTOR),
        token_address: None,
        beneficiary: None,
        base_token_uri: None,
        max_keys_per_address: None,
    };

    let mut events = HashMap::new();
    events.insert(
        EventKind::NewLock,
        EventCodec {
            name: "NewLock",
            topic: NewLock::SIGNATURE_HASH,
            decode: decode_new_lock,
        },
    );
    events.insert(
        EventKind::Transfer,
        EventCodec {
            name: "Transfer",
            topic: Transfer::SIGNATURE_HASH,
            decode: decode_transfer,
        },
    );
    events.insert(
        EventKind::PriceChanged,
        EventCodec {
            name: "PriceChanged",
            topic: PriceChanged::SIGNATURE_HASH,
            decode: decode_price_changed,
        },
    );
    events.insert(
        EventKind::Withdrawal,
        EventCodec {
            name: "Withdrawal",
            topic: Withdrawal::SIGNATURE_HASH,
            decode: decode_withdrawal,
        },
    );

    let probe = vec![
        keyPriceCall::SELECTOR,
        expirationDurationCall::SELECTOR,
        numberOfOutstandingKeysCall::SELECTOR,
    ];

    TableBuilder {
        ops,
        views,
        events,
        probe,
    }
}

fn encode_create_lock(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::CreateLock {
            expiration_duration,
            key_price,
            max_number_of_keys,
            ..
        } => Ok(createLockCall {
            _expirationDuration: *expiration_duration,
            _keyPrice: *key_price,
            _maxNumberOfKeys: *max_number_of_keys,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_purchase(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::PurchaseKey { recipient, .. } => Ok(purchaseForCall {
            _recipient: *recipient,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_withdraw(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::Withdraw { .. } => Ok(withdrawCall {}.abi_encode().into()),
        other => Err(mismatch(other)),
    }
}

fn encode_set_key_price(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetKeyPrice { key_price, .. } => Ok(updateKeyPriceCall {
            _keyPrice: *key_price,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn decode_err(e: impl std::fmt::Display) -> ReadError {
    ReadError::DecodeFailed {
        message: e.to_string(),
    }
}

fn decode_new_lock(topics: &[alloy_primitives::B256], data: &[u8]) -> Result<Vec<FieldValue>, ReadError> {
    let ev = NewLock::decode_raw_log(topics.iter().copied(), data, true).map_err(decode_err)?;
    Ok(vec![
        FieldValue::Address(ev.lockOwner),
        FieldValue::Address(ev.newLockAddress),
    ])
}

fn decode_transfer(topics: &[alloy_primitives::B256], data: &[u8]) -> Result<Vec<FieldValue>, ReadError> {
    let ev = Transfer::decode_raw_log(topics.iter().copied(), data, true).map_err(decode_err)?;
    Ok(vec![
        FieldValue::Address(ev._from),
        FieldValue::Address(ev._to),
        FieldValue::Uint(ev._tokenId),
    ])
}

fn decode_price_changed(
    topics: &[alloy_primitives::B256],
    data: &[u8],
) -> Result<Vec<FieldValue>, ReadError> {
    let ev = PriceChanged::decode_raw_log(topics.iter().copied(), data, true).map_err(decode_err)?;
    Ok(vec![
        FieldValue::Uint(ev.oldKeyPrice),
        FieldValue::Uint(ev.keyPrice),
    ])
}

fn decode_withdrawal(
    topics: &[alloy_primitives::B256],
    data: &[u8],
) -> Result<Vec<FieldValue>, ReadError> {
    let ev = Withdrawal::decode_raw_log(topics.iter().copied(), data, true).map_err(decode_err)?;
    Ok(vec![
        FieldValue::Address(ev.beneficiary),
        FieldValue::Uint(ev.amount),
    ])
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{keccak256, Address, U256};

    use super::*;

    #[test]
    fn selectors_match_signatures() {
        assert_eq!(
            &purchaseForCall::SELECTOR[..],
            &keccak256(b"purchaseFor(address)")[..4]
        );
        assert_eq!(&keyPriceCall::SELECTOR[..], &keccak256(b"keyPrice()")[..4]);
        assert_eq!(
            &createLockCall::SELECTOR[..],
            &keccak256(b"createLock(uint256,uint256,uint256)")[..4]
        );
    }

    #[test]
    fn transfer_topic_matches_erc721_signature() {
        assert_eq!(
            Transfer::SIGNATURE_HASH,
            keccak256(b"Transfer(address,address,uint256)")
        );
    }

    #[test]
    fn purchase_encodes_recipient_only() {
        let request = OperationRequest::PurchaseKey {
            value: U256::from(10u64).pow(U256::from(16u64)),
            recipient: Address::repeat_byte(0x22),
            referrer: Address::repeat_byte(0x33),
            data: vec![1, 2, 3].into(),
        };
        let calldata = encode_purchase(&request).unwrap();
        // selector + one padded address; value/referrer/data predate v7
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[..4], purchaseForCall::SELECTOR);
        assert_eq!(&calldata[16..36], Address::repeat_byte(0x22).as_slice());
    }

    #[test]
    fn mismatched_request_is_rejected() {
        let request = OperationRequest::SetBaseUri {
            base_token_uri: String::new(),
        };
        assert!(encode_purchase(&request).is_err());
    }

    #[test]
    fn transfer_log_round_trip() {
        let from = Address::ZERO;
        let to = Address::repeat_byte(0x44);
        let token_id = U256::from(17u64);
        let topics = vec![
            Transfer::SIGNATURE_HASH,
            from.into_word(),
            to.into_word(),
            alloy_primitives::B256::from(token_id),
        ];
        let fields = decode_transfer(&topics, &[]).unwrap();
        assert_eq!(fields[1].as_address(), Some(to));
        assert_eq!(fields[2].as_uint(), Some(token_id));
    }
}
