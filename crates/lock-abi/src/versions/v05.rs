//! v5: ERC721-conformant supply accounting, dedicated beneficiary

use alloy_sol_types::{sol, SolCall};

use crate::registry::{TableBuilder, ViewFn};
use crate::versions::v02;

sol! {
    function totalSupply() external view returns (uint256);
    function beneficiary() external view returns (address);
}

pub(crate) fn apply(table: &mut TableBuilder) {
    table.views.outstanding_keys = ViewFn::new(totalSupplyCall::SELECTOR);
    table.views.beneficiary = Some(ViewFn::new(beneficiaryCall::SELECTOR));

    // numberOfOutstandingKeys is gone from v5 contracts; probing for it
    // would reject every v5+ deployment
    table
        .probe
        .retain(|s| *s != v02::numberOfOutstandingKeysCall::SELECTOR);
    table
        .probe
        .extend([totalSupplyCall::SELECTOR, beneficiaryCall::SELECTOR]);
}
