//! v9: post-deployment capacity and duration changes

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use turnstile_core::{OperationKind, TxError};

use crate::ops::{mismatch, OperationRequest};
use crate::registry::{OpCodec, TableBuilder, ViewFn};

sol! {
    function maxKeysPerAddress() external view returns (uint256);
    function setMaxNumberOfKeys(uint256 _maxNumberOfKeys) external;
    function setExpirationDuration(uint256 _newExpirationDuration) external;
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.views.max_keys_per_address = Some(ViewFn::new(maxKeysPerAddressCall::SELECTOR));
    table.ops.insert(
        OperationKind::SetMaxKeys,
        OpCodec {
            selector: setMaxNumberOfKeysCall::SELECTOR,
            encode: encode_set_max_keys,
        },
    );
    table.ops.insert(
        OperationKind::SetExpirationDuration,
        OpCodec {
            selector: setExpirationDurationCall::SELECTOR,
            encode: encode_set_expiration_duration,
        },
    );
    table.probe.push(maxKeysPerAddressCall::SELECTOR);
}

fn encode_set_max_keys(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetMaxKeys { max_number_of_keys } => Ok(setMaxNumberOfKeysCall {
            _maxNumberOfKeys: *max_number_of_keys,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_set_expiration_duration(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetExpirationDuration { duration } => Ok(setExpirationDurationCall {
            _newExpirationDuration: *duration,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}
