//! v8: metadata URI and purchase/cancel hooks

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use turnstile_core::{OperationKind, TxError};

use crate::ops::{mismatch, OperationRequest};
use crate::registry::{OpCodec, TableBuilder, ViewFn};

sol! {
    function baseTokenURI() external view returns (string);
    function setBaseTokenURI(string _baseTokenURI) external;
    function setEventHooks(address _onKeyPurchaseHook, address _onKeyCancelHook) external;
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.views.base_token_uri = Some(ViewFn::new(baseTokenURICall::SELECTOR));
    table.ops.insert(
        OperationKind::SetBaseUri,
        OpCodec {
            selector: setBaseTokenURICall::SELECTOR,
            encode: encode_set_base_uri,
        },
    );
    table.ops.insert(
        OperationKind::SetEventHooks,
        OpCodec {
            selector: setEventHooksCall::SELECTOR,
            encode: encode_set_event_hooks,
        },
    );
    table.probe.push(baseTokenURICall::SELECTOR);
}

fn encode_set_base_uri(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetBaseUri { base_token_uri } => Ok(setBaseTokenURICall {
            _baseTokenURI: base_token_uri.clone(),
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

fn encode_set_event_hooks(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetEventHooks { hooks } => Ok(setEventHooksCall {
            _onKeyPurchaseHook: hooks.on_key_purchase,
            _onKeyCancelHook: hooks.on_key_cancel,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::*;
    use crate::ops::EventHooks;

    #[test]
    fn hooks_beyond_the_version_are_dropped() {
        let request = OperationRequest::SetEventHooks {
            hooks: EventHooks {
                on_key_purchase: Address::repeat_byte(1),
                on_key_cancel: Address::repeat_byte(2),
                on_valid_key: Address::repeat_byte(3),
                on_token_uri: Address::repeat_byte(4),
            },
        };
        let calldata = encode_set_event_hooks(&request).unwrap();
        let decoded = setEventHooksCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded._onKeyPurchaseHook, Address::repeat_byte(1));
        assert_eq!(decoded._onKeyCancelHook, Address::repeat_byte(2));
        // only the two v8 hook slots are encoded
        assert_eq!(calldata.len(), 4 + 64);
    }
}
