//! The process-wide version registry
//!
//! One dispatch table per protocol version, built once by composing the
//! v2 base table with cumulative per-version overrides. Lookup is pure
//! data access: no dynamic dispatch, no inheritance chains.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolValue;
use turnstile_core::{OperationKind, ReadError, TxError, VersionTag};

use crate::events::{EventKind, FieldValue};
use crate::ops::OperationRequest;
use crate::versions;

/// Encodes a resolved request into calldata
pub type EncodeFn = fn(&OperationRequest) -> Result<Bytes, TxError>;

/// Decodes `(topics, data)` of a matching log into ordered field values
pub type EventDecodeFn = fn(&[B256], &[u8]) -> Result<Vec<FieldValue>, ReadError>;

/// One operation's wire binding for one version
#[derive(Debug, Clone, Copy)]
pub struct OpCodec {
    pub selector: [u8; 4],
    pub encode: EncodeFn,
}

/// A no-argument (or single-address-argument) view function binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewFn {
    selector: [u8; 4],
}

impl ViewFn {
    pub const fn new(selector: [u8; 4]) -> Self {
        Self { selector }
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Calldata for a no-argument call
    pub fn calldata(&self) -> Bytes {
        self.selector.to_vec().into()
    }

    /// Calldata with one address argument
    pub fn calldata_address(&self, arg: Address) -> Bytes {
        let mut data = self.selector.to_vec();
        data.extend_from_slice(&arg.abi_encode());
        data.into()
    }
}

/// The readable lock attributes one version exposes. Optional entries
/// are `None` on versions that predate the attribute.
#[derive(Debug, Clone, Copy)]
pub struct ViewSchema {
    pub key_price: ViewFn,
    pub expiration_duration: ViewFn,
    pub max_number_of_keys: ViewFn,
    /// `numberOfOutstandingKeys()` through v4, `totalSupply()` from v5
    pub outstanding_keys: ViewFn,
    pub owner: ViewFn,
    /// `keyExpirationTimestampFor(address)`
    pub key_expiration: ViewFn,
    /// v3+; absent means the version only supports native pricing
    pub token_address: Option<ViewFn>,
    /// v5+
    pub beneficiary: Option<ViewFn>,
    /// v8+
    pub base_token_uri: Option<ViewFn>,
    /// v9+
    pub max_keys_per_address: Option<ViewFn>,
}

/// One event's wire binding for one version
#[derive(Debug, Clone, Copy)]
pub struct EventCodec {
    /// Version-specific Solidity event name
    pub name: &'static str,
    /// topic0 (keccak of the event signature)
    pub topic: B256,
    pub decode: EventDecodeFn,
}

/// The full interface of one protocol version
#[derive(Debug, Clone)]
pub struct ProtocolVersion {
    tag: VersionTag,
    ops: HashMap<OperationKind, OpCodec>,
    views: ViewSchema,
    events: HashMap<EventKind, EventCodec>,
    probe: Vec<[u8; 4]>,
}

impl ProtocolVersion {
    pub fn tag(&self) -> VersionTag {
        self.tag
    }

    pub fn views(&self) -> &ViewSchema {
        &self.views
    }

    pub fn supports(&self, kind: OperationKind) -> bool {
        self.ops.contains_key(&kind)
    }

    pub fn selector(&self, kind: OperationKind) -> Option<[u8; 4]> {
        self.ops.get(&kind).map(|codec| codec.selector)
    }

    /// Encode a request against this version's operation table
    pub fn encode(&self, request: &OperationRequest) -> Result<Bytes, TxError> {
        let kind = request.kind();
        let codec = self.ops.get(&kind).ok_or(TxError::UnsupportedOperation {
            version: self.tag,
            operation: kind,
        })?;
        (codec.encode)(request)
    }

    pub fn event(&self, kind: EventKind) -> Option<&EventCodec> {
        self.events.get(&kind)
    }

    /// View selectors that must all answer for a contract to match this
    /// version structurally
    pub fn probe_selectors(&self) -> &[[u8; 4]] {
        &self.probe
    }

    /// Identify the operation encoded in raw calldata, if any
    pub fn classify(&self, calldata: &[u8]) -> Option<OperationKind> {
        if calldata.len() < 4 {
            return None;
        }
        self.ops
            .iter()
            .find(|(_, codec)| codec.selector == calldata[..4])
            .map(|(kind, _)| *kind)
    }
}

/// Mutable table state threaded through the version override chain
pub(crate) struct TableBuilder {
    pub(crate) ops: HashMap<OperationKind, OpCodec>,
    pub(crate) views: ViewSchema,
    pub(crate) events: HashMap<EventKind, EventCodec>,
    pub(crate) probe: Vec<[u8; 4]>,
}

impl TableBuilder {
    fn freeze(&self, tag: u16) -> ProtocolVersion {
        ProtocolVersion {
            tag: VersionTag::new(tag),
            ops: self.ops.clone(),
            views: self.views,
            events: self.events.clone(),
            probe: self.probe.clone(),
        }
    }
}

/// All known protocol versions, keyed by tag
#[derive(Debug)]
pub struct Registry {
    versions: BTreeMap<u16, ProtocolVersion>,
}

impl Registry {
    pub fn get(&self, tag: VersionTag) -> Option<&ProtocolVersion> {
        self.versions.get(&tag.as_u16())
    }

    /// The most recent supported version
    pub fn newest(&self) -> &ProtocolVersion {
        self.versions
            .values()
            .next_back()
            .expect("registry is built non-empty")
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &ProtocolVersion> {
        self.versions.values().rev()
    }

    pub fn tags(&self) -> impl Iterator<Item = VersionTag> + '_ {
        self.versions.keys().map(|tag| VersionTag::new(*tag))
    }
}

/// The registry, built on first access and shared by all clients.
/// Version tables are static facts; the registry is never mutated.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(build)
}

fn build() -> Registry {
    let mut table = versions::v02::base();
    let mut by_tag = BTreeMap::new();
    by_tag.insert(2, table.freeze(2));

    let overrides: [(u16, fn(&mut TableBuilder)); 9] = [
        (3, versions::v03::apply),
        (4, versions::v04::apply),
        (5, versions::v05::apply),
        // v6 changed contract internals, not the interface
        (6, versions::unchanged),
        (7, versions::v07::apply),
        (8, versions::v08::apply),
        (9, versions::v09::apply),
        (10, versions::v10::apply),
        (11, versions::v11::apply),
    ];
    for (tag, apply) in overrides {
        apply(&mut table);
        by_tag.insert(tag, table.freeze(tag));
    }
    // v12 is interface-identical to v11
    by_tag.insert(12, table.freeze(12));

    Registry { versions: by_tag }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::*;

    #[test]
    fn all_tags_present() {
        let reg = registry();
        let tags: Vec<u16> = reg.tags().map(|t| t.as_u16()).collect();
        assert_eq!(tags, (2..=12).collect::<Vec<u16>>());
        assert_eq!(reg.newest().tag(), VersionTag::new(12));
    }

    #[test]
    fn newest_first_order() {
        let tags: Vec<u16> = registry()
            .newest_first()
            .map(|v| v.tag().as_u16())
            .collect();
        assert_eq!(tags, (2..=12).rev().collect::<Vec<u16>>());
    }

    #[test]
    fn operation_support_grows_with_versions() {
        let reg = registry();
        let v2 = reg.get(VersionTag::new(2)).unwrap();
        let v4 = reg.get(VersionTag::new(4)).unwrap();
        let v9 = reg.get(VersionTag::new(9)).unwrap();

        assert!(v2.supports(OperationKind::PurchaseKey));
        assert!(!v2.supports(OperationKind::GrantKeys));
        assert!(!v2.supports(OperationKind::SetBaseUri));

        assert!(v4.supports(OperationKind::GrantKeys));
        assert!(!v4.supports(OperationKind::SetMaxKeys));

        assert!(v9.supports(OperationKind::SetMaxKeys));
        assert!(v9.supports(OperationKind::SetExpirationDuration));
    }

    #[test]
    fn unsupported_operation_is_an_error() {
        let v2 = registry().get(VersionTag::new(2)).unwrap();
        let err = v2
            .encode(&OperationRequest::SetBaseUri {
                base_token_uri: "ipfs://".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, TxError::UnsupportedOperation { .. }));
    }

    #[test]
    fn purchase_selector_changes_at_v7_and_v11() {
        let reg = registry();
        let sel = |tag: u16| {
            reg.get(VersionTag::new(tag))
                .unwrap()
                .selector(OperationKind::PurchaseKey)
                .unwrap()
        };
        assert_eq!(sel(2), sel(5));
        assert_ne!(sel(5), sel(7));
        assert_eq!(sel(7), sel(10));
        assert_ne!(sel(10), sel(11));
        assert_eq!(sel(11), sel(12));
    }

    #[test]
    fn inherited_views_survive_overrides() {
        let reg = registry();
        let v2 = reg.get(VersionTag::new(2)).unwrap();
        let v7 = reg.get(VersionTag::new(7)).unwrap();

        // keyPrice was never overridden
        assert_eq!(v7.views().key_price, v2.views().key_price);
        // outstanding keys moved to totalSupply at v5
        assert_ne!(v7.views().outstanding_keys, v2.views().outstanding_keys);
        // optional views appear at their introduction
        assert!(v2.views().token_address.is_none());
        assert!(v7.views().token_address.is_some());
        assert!(v7.views().max_keys_per_address.is_none());
        assert!(reg
            .get(VersionTag::new(9))
            .unwrap()
            .views()
            .max_keys_per_address
            .is_some());
    }

    #[test]
    fn price_event_renamed_at_v7() {
        let reg = registry();
        let v5 = reg.get(VersionTag::new(5)).unwrap();
        let v7 = reg.get(VersionTag::new(7)).unwrap();

        let old = v5.event(EventKind::PriceChanged).unwrap();
        let new = v7.event(EventKind::PriceChanged).unwrap();
        assert_eq!(old.name, "PriceChanged");
        assert_eq!(new.name, "PricingChanged");
        assert_ne!(old.topic, new.topic);
    }

    #[test]
    fn classify_round_trips_encoded_calldata() {
        let v7 = registry().get(VersionTag::new(7)).unwrap();
        let request = OperationRequest::PurchaseKey {
            value: U256::from(5_000_000u64),
            recipient: Address::repeat_byte(0x11),
            referrer: Address::ZERO,
            data: Bytes::new(),
        };
        let calldata = v7.encode(&request).unwrap();
        assert_eq!(v7.classify(&calldata), Some(OperationKind::PurchaseKey));
        assert_eq!(v7.classify(&[0x00]), None);
        assert_eq!(v7.classify(&[0xde, 0xad, 0xbe, 0xef]), None);
    }
}
