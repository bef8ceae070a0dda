//! Receipt decoding
//!
//! A mined transaction's receipt interleaves logs from every contract
//! the call touched: an ERC20 `Transfer` from the payment token lands
//! next to the lock's own `Transfer`. Extraction filters to the
//! contract of interest first, then decodes against the resolved
//! version's event table. A missing event is a soft condition: the
//! state change may well have succeeded, so the result is simply
//! absent, never an error.

use alloy_primitives::Address;
use evm_provider::TransactionReceipt;
use lock_abi::{EventKind, EventRecord, ProtocolVersion};
use turnstile_core::{OperationKind, OperationOutcome};

/// First log on `contract` matching `kind` under `version`'s event
/// table, decoded. Logs from other contracts in the same receipt are
/// ignored.
pub fn decode_event(
    receipt: &TransactionReceipt,
    version: &ProtocolVersion,
    contract: Address,
    kind: EventKind,
) -> Option<EventRecord> {
    let codec = version.event(kind)?;
    receipt
        .logs
        .iter()
        .filter(|log| log.address == contract)
        .find_map(|log| {
            if log.topics.first() != Some(&codec.topic) {
                return None;
            }
            match (codec.decode)(&log.topics, &log.data) {
                Ok(fields) => Some(EventRecord {
                    address: log.address,
                    name: codec.name.to_string(),
                    fields,
                }),
                Err(e) => {
                    tracing::warn!(%contract, event = codec.name, error = %e, "undecodable log skipped");
                    None
                }
            }
        })
}

/// The structured result a confirmed operation derives from its receipt
pub(crate) fn extract_outcome(
    operation: OperationKind,
    receipt: &TransactionReceipt,
    version: &ProtocolVersion,
    contract: Address,
) -> Option<OperationOutcome> {
    match operation {
        OperationKind::CreateLock => {
            let record = decode_event(receipt, version, contract, EventKind::NewLock)?;
            Some(OperationOutcome::LockCreated {
                lock: record.field_address(1)?,
            })
        }
        OperationKind::PurchaseKey | OperationKind::GrantKeys => {
            let record = decode_event(receipt, version, contract, EventKind::Transfer)?;
            Some(OperationOutcome::KeyMinted {
                token_id: record.field_uint(2)?,
                owner: record.field_address(1)?,
            })
        }
        OperationKind::Withdraw => {
            let record = decode_event(receipt, version, contract, EventKind::Withdrawal)?;
            let amount = record.fields.last()?.as_uint()?;
            Some(OperationOutcome::Withdrawn { amount })
        }
        // Configuration changes have no derived result
        _ => None,
    }
}
