//! v3: version accessor, ERC20 pricing, named locks

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use turnstile_core::{OperationKind, TxError};

use crate::ops::{mismatch, OperationRequest};
use crate::registry::{OpCodec, TableBuilder, ViewFn};

sol! {
    function publicLockVersion() external view returns (uint256);
    function tokenAddress() external view returns (address);

    function createLock(uint256 _expirationDuration, address _tokenAddress, uint256 _keyPrice, uint256 _maxNumberOfKeys, string _lockName) external;
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.views.token_address = Some(ViewFn::new(tokenAddressCall::SELECTOR));
    table.ops.insert(
        OperationKind::CreateLock,
        OpCodec {
            selector: createLockCall::SELECTOR,
            encode: encode_create_lock,
        },
    );
    table
        .probe
        .extend([publicLockVersionCall::SELECTOR, tokenAddressCall::SELECTOR]);
}

fn encode_create_lock(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::CreateLock {
            expiration_duration,
            token_address,
            key_price,
            max_number_of_keys,
            name,
        } => Ok(createLockCall {
            _expirationDuration: *expiration_duration,
            _tokenAddress: *token_address,
            _keyPrice: *key_price,
            _maxNumberOfKeys: *max_number_of_keys,
            _lockName: name.clone(),
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{keccak256, Address, U256};

    use super::*;

    #[test]
    fn create_lock_signature() {
        assert_eq!(
            &createLockCall::SELECTOR[..],
            &keccak256(b"createLock(uint256,address,uint256,uint256,string)")[..4]
        );
    }

    #[test]
    fn create_lock_carries_currency_and_name() {
        let token = Address::repeat_byte(0x66);
        let request = OperationRequest::CreateLock {
            expiration_duration: U256::from(60 * 60 * 24 * 30u64),
            token_address: token,
            key_price: U256::from(5_000_000u64),
            max_number_of_keys: U256::MAX,
            name: "Gym membership".to_string(),
        };
        let calldata = encode_create_lock(&request).unwrap();
        assert_eq!(&calldata[..4], createLockCall::SELECTOR);
        let decoded = createLockCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded._tokenAddress, token);
        assert_eq!(decoded._lockName, "Gym membership");
        assert_eq!(decoded._maxNumberOfKeys, U256::MAX);
    }
}
