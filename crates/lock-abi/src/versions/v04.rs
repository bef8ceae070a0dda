//! v4: key granting, partial withdrawals

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use turnstile_core::{OperationKind, TxError};

use crate::ops::{mismatch, OperationRequest};
use crate::registry::{OpCodec, TableBuilder};

sol! {
    function grantKeys(address[] _recipients, uint256[] _expirationTimestamps) external;
    function withdraw(uint256 _amount) external;
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.ops.insert(
        OperationKind::GrantKeys,
        OpCodec {
            selector: grantKeysCall::SELECTOR,
            encode: encode_grant_keys,
        },
    );
    table.ops.insert(
        OperationKind::Withdraw,
        OpCodec {
            selector: withdrawCall::SELECTOR,
            encode: encode_withdraw,
        },
    );
}

fn encode_grant_keys(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::GrantKeys {
            recipients,
            expiration_timestamps,
            ..
        } => Ok(grantKeysCall {
            _recipients: recipients.clone(),
            _expirationTimestamps: expiration_timestamps.clone(),
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_withdraw(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::Withdraw { amount, .. } => Ok(withdrawCall { _amount: *amount }
            .abi_encode()
            .into()),
        other => Err(mismatch(other)),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::*;

    #[test]
    fn grant_keys_encodes_parallel_arrays() {
        let request = OperationRequest::GrantKeys {
            recipients: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            expiration_timestamps: vec![U256::from(1_000u64), U256::from(2_000u64)],
            key_managers: vec![],
        };
        let calldata = encode_grant_keys(&request).unwrap();
        let decoded = grantKeysCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded._recipients.len(), 2);
        assert_eq!(decoded._expirationTimestamps[1], U256::from(2_000u64));
    }
}
