//! evm-erc20: Fungible-token adapter
//!
//! Thin wrappers around the generic call mechanism for the stable ERC20
//! surface: balance, allowance, decimals, symbol reads, and approval
//! calldata construction. Token contracts follow one standard, so none
//! of this is protocol-version-dependent.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use evm_provider::{CallData, Provider};
use tokio::sync::RwLock;
use turnstile_core::{ApprovalState, Error, ReadError};

sol! {
    function decimals() external view returns (uint8);
    function symbol() external view returns (string);
    function balanceOf(address _owner) external view returns (uint256);
    function allowance(address _owner, address _spender) external view returns (uint256);
    function approve(address _spender, uint256 _amount) external returns (bool);
}

/// ERC20 function selectors, exposed for tests and call classification
pub mod selectors {
    use alloy_sol_types::SolCall;

    pub const DECIMALS: [u8; 4] = super::decimalsCall::SELECTOR;
    pub const SYMBOL: [u8; 4] = super::symbolCall::SELECTOR;
    pub const BALANCE_OF: [u8; 4] = super::balanceOfCall::SELECTOR;
    pub const ALLOWANCE: [u8; 4] = super::allowanceCall::SELECTOR;
    pub const APPROVE: [u8; 4] = super::approveCall::SELECTOR;
}

/// Read and approval-construction adapter over ERC20 token contracts.
///
/// Decimals are cached per token for the process lifetime: a token's
/// precision is fixed at deployment. The cache is append-only under an
/// async RwLock; concurrent resolution of the same token at worst reads
/// the chain twice and agrees on the value.
pub struct Erc20Adapter {
    provider: Arc<dyn Provider>,
    decimals_cache: RwLock<HashMap<Address, u8>>,
}

impl Erc20Adapter {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            decimals_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Decimal precision of a token (cached)
    pub async fn decimals(&self, token: Address) -> Result<u8, Error> {
        if let Some(cached) = self.decimals_cache.read().await.get(&token) {
            return Ok(*cached);
        }

        let ret = self.call(token, decimalsCall {}.abi_encode()).await?;
        let decimals = decimalsCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error(token, e))?
            ._0;

        self.decimals_cache
            .write()
            .await
            .entry(token)
            .or_insert(decimals);
        Ok(decimals)
    }

    /// Display symbol of a token
    pub async fn symbol(&self, token: Address) -> Result<String, Error> {
        let ret = self.call(token, symbolCall {}.abi_encode()).await?;
        Ok(symbolCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error(token, e))?
            ._0)
    }

    /// Token balance of `holder`
    pub async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, Error> {
        let ret = self
            .call(token, balanceOfCall { _owner: holder }.abi_encode())
            .await?;
        Ok(balanceOfCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error(token, e))?
            ._0)
    }

    /// Amount `spender` may currently move on behalf of `owner`
    pub async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, Error> {
        let ret = self
            .call(
                token,
                allowanceCall {
                    _owner: owner,
                    _spender: spender,
                }
                .abi_encode(),
            )
            .await?;
        Ok(allowanceCall::abi_decode_returns(&ret, true)
            .map_err(|e| decode_error(token, e))?
            ._0)
    }

    /// Current allowance measured against `required`
    pub async fn approval_state(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        required: U256,
    ) -> Result<ApprovalState, Error> {
        let approved = self.allowance(token, owner, spender).await?;
        Ok(ApprovalState {
            token,
            owner,
            spender,
            approved,
            required,
        })
    }

    /// Build (do not submit) an approval call
    pub fn build_approve(&self, token: Address, spender: Address, amount: U256) -> CallData {
        CallData::new(
            token,
            approveCall {
                _spender: spender,
                _amount: amount,
            }
            .abi_encode(),
        )
    }

    async fn call(&self, token: Address, data: Vec<u8>) -> Result<Bytes, Error> {
        self.provider
            .call(token, data.into())
            .await
            .map_err(|e| {
                ReadError::TokenReadFailed {
                    token,
                    message: e.to_string(),
                }
                .into()
            })
    }
}

fn decode_error(token: Address, e: impl std::fmt::Display) -> Error {
    ReadError::TokenReadFailed {
        token,
        message: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::SolValue;
    use evm_provider::mock::MockProvider;

    use super::*;

    fn token() -> Address {
        Address::repeat_byte(0xee)
    }

    #[tokio::test]
    async fn decimals_are_cached_per_token() {
        let provider = Arc::new(MockProvider::new());
        provider.respond(token(), selectors::DECIMALS, U256::from(6u8).abi_encode());

        let adapter = Erc20Adapter::new(provider.clone());
        assert_eq!(adapter.decimals(token()).await.unwrap(), 6);
        assert_eq!(adapter.decimals(token()).await.unwrap(), 6);
        assert_eq!(provider.call_count(token(), selectors::DECIMALS), 1);
    }

    #[tokio::test]
    async fn allowance_decodes_chain_answer() {
        let provider = Arc::new(MockProvider::new());
        provider.respond(
            token(),
            selectors::ALLOWANCE,
            U256::from(5_000_000u64).abi_encode(),
        );

        let adapter = Erc20Adapter::new(provider);
        let state = adapter
            .approval_state(
                token(),
                Address::repeat_byte(1),
                Address::repeat_byte(2),
                U256::from(7_000_000u64),
            )
            .await
            .unwrap();
        assert!(!state.is_sufficient());
        assert_eq!(state.deficit(), U256::from(2_000_000u64));
    }

    #[tokio::test]
    async fn read_failure_names_the_token() {
        let provider = Arc::new(MockProvider::new());
        provider.respond_revert(token(), selectors::SYMBOL);

        let adapter = Erc20Adapter::new(provider);
        let err = adapter.symbol(token()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Read(ReadError::TokenReadFailed { .. })
        ));
    }

    #[test]
    fn approve_calldata_is_unsigned_and_valueless() {
        let provider = Arc::new(MockProvider::new());
        let adapter = Erc20Adapter::new(provider);
        let call = adapter.build_approve(token(), Address::repeat_byte(3), U256::from(9u64));

        assert_eq!(call.to, token());
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(&call.data[..4], selectors::APPROVE);

        let decoded = approveCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(decoded._spender, Address::repeat_byte(3));
        assert_eq!(decoded._amount, U256::from(9u64));
    }
}
