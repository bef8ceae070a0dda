//! lock-abi: Version-aware ABI tables for the lock contract family
//!
//! The lock contracts evolved through many incompatible interfaces
//! (v2 through v12). This crate holds one dispatch table per version
//! (operation encoders, view selectors, and event codecs) composed from
//! a v2 base plus cumulative per-version overrides, and the resolver
//! that maps a deployed contract to the table that understands it.

pub mod events;
pub mod ops;
pub mod registry;
pub mod resolver;

mod versions;

pub use events::{EventKind, EventRecord, FieldValue};
pub use ops::{EventHooks, OperationRequest};
pub use registry::{registry, EventCodec, OpCodec, ProtocolVersion, Registry, ViewFn, ViewSchema};
pub use resolver::{accessor_selector, VersionResolver};
