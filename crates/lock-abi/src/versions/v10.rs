//! v10: four-slot event hooks

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use turnstile_core::{OperationKind, TxError};

use crate::ops::{mismatch, OperationRequest};
use crate::registry::{OpCodec, TableBuilder};

sol! {
    function setEventHooks(address _onKeyPurchaseHook, address _onKeyCancelHook, address _onValidKeyHook, address _onTokenURIHook) external;
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.ops.insert(
        OperationKind::SetEventHooks,
        OpCodec {
            selector: setEventHooksCall::SELECTOR,
            encode: encode_set_event_hooks,
        },
    );
}

fn encode_set_event_hooks(request: &OperationRequest) -> Result<Bytes, TxError> {
    match request {
        OperationRequest::SetEventHooks { hooks } => Ok(setEventHooksCall {
            _onKeyPurchaseHook: hooks.on_key_purchase,
            _onKeyCancelHook: hooks.on_key_cancel,
            _onValidKeyHook: hooks.on_valid_key,
            _onTokenURIHook: hooks.on_token_uri,
        }
        .abi_encode()
        .into()),
        other => Err(mismatch(other)),
    }
}
