//! Shared scripting helpers for the client test suites

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use evm_provider::mock::{MockProvider, MockSigner};
use lock_abi::{accessor_selector, registry};
use turnstile_core::{ClientConfig, VersionTag};

use crate::LockClient;

pub(crate) const ACCOUNT: Address = Address::repeat_byte(0x01);

pub(crate) fn lock_address() -> Address {
    Address::repeat_byte(0x4c)
}

pub(crate) fn token_address() -> Address {
    Address::repeat_byte(0xda)
}

/// A client with millisecond polling so confirmation waits finish fast
pub(crate) fn fast_client(provider: Arc<MockProvider>) -> (LockClient, Arc<MockSigner>) {
    let signer = Arc::new(MockSigner::new(ACCOUNT));
    let config = ClientConfig {
        poll_interval_ms: 5,
        ..ClientConfig::default()
    };
    let client = LockClient::new(provider, signer.clone(), config);
    (client, signer)
}

/// Script every view a v9 lock answers, priced at 5.00 in a 6-decimal
/// token, with unlimited capacity
pub(crate) fn script_v9_token_lock(provider: &MockProvider) {
    let lock = lock_address();
    let token = token_address();
    let views = registry().get(VersionTag::new(9)).unwrap().views();

    provider.respond(lock, accessor_selector(), U256::from(9u64).abi_encode());
    provider.respond(
        lock,
        views.key_price.selector(),
        U256::from(5_000_000u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.expiration_duration.selector(),
        U256::from(2_592_000u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.max_number_of_keys.selector(),
        U256::MAX.abi_encode(),
    );
    provider.respond(
        lock,
        views.outstanding_keys.selector(),
        U256::from(12u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.owner.selector(),
        Address::repeat_byte(0x99).abi_encode(),
    );
    provider.respond(
        lock,
        views.beneficiary.unwrap().selector(),
        Address::repeat_byte(0x98).abi_encode(),
    );
    provider.respond(
        lock,
        views.base_token_uri.unwrap().selector(),
        "ipfs://locks/".to_string().abi_encode(),
    );
    provider.respond(
        lock,
        views.max_keys_per_address.unwrap().selector(),
        U256::from(1u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.token_address.unwrap().selector(),
        token.abi_encode(),
    );

    provider.respond(token, evm_erc20::selectors::DECIMALS, U256::from(6u8).abi_encode());
    provider.respond(
        token,
        evm_erc20::selectors::SYMBOL,
        "USDC".to_string().abi_encode(),
    );
    provider.respond(
        token,
        evm_erc20::selectors::BALANCE_OF,
        U256::from(60_000_000u64).abi_encode(),
    );
}

/// Script a v5 lock priced at 0.01 native currency
pub(crate) fn script_v5_native_lock(provider: &MockProvider) {
    let lock = lock_address();
    let views = registry().get(VersionTag::new(5)).unwrap().views();

    provider.respond(lock, accessor_selector(), U256::from(5u64).abi_encode());
    provider.respond(
        lock,
        views.key_price.selector(),
        U256::from(10_000_000_000_000_000u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.expiration_duration.selector(),
        U256::from(86_400u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.max_number_of_keys.selector(),
        U256::from(100u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.outstanding_keys.selector(),
        U256::from(3u64).abi_encode(),
    );
    provider.respond(
        lock,
        views.owner.selector(),
        Address::repeat_byte(0x99).abi_encode(),
    );
    provider.respond(
        lock,
        views.beneficiary.unwrap().selector(),
        Address::repeat_byte(0x99).abi_encode(),
    );
    provider.respond(
        lock,
        views.token_address.unwrap().selector(),
        Address::ZERO.abi_encode(),
    );
}

/// Allowance currently granted by the test account to the lock
pub(crate) fn script_allowance(provider: &MockProvider, amount: U256) {
    provider.respond(
        token_address(),
        evm_erc20::selectors::ALLOWANCE,
        amount.abi_encode(),
    );
}
