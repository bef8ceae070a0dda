//! Per-version interface definitions
//!
//! Each module declares the Solidity items its version introduced or
//! changed, and an `apply` that patches the running table. Versions with
//! no interface delta (v6, v12) reuse the previous table unchanged.

pub(crate) mod v02;
pub(crate) mod v03;
pub(crate) mod v04;
pub(crate) mod v05;
pub(crate) mod v07;
pub(crate) mod v08;
pub(crate) mod v09;
pub(crate) mod v10;
pub(crate) mod v11;

use crate::registry::TableBuilder;

/// Override for versions that changed contract internals only
pub(crate) fn unchanged(_table: &mut TableBuilder) {}
