//! Scripted provider and signer doubles
//!
//! Responses are keyed by `(contract, selector)`, broadcasts are
//! recorded, and receipts can either be staged explicitly or produced by
//! auto-mining each send. Patterns (byte subsequences of the signed
//! payload, e.g. a recipient address) select which sends revert or carry
//! logs, so concurrent submissions stay deterministic to assert against.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use turnstile_core::ProviderError;

use crate::{
    LogEntry, Provider, Result, SignedTransaction, Signer, TransactionReceipt, TransactionRequest,
};

#[derive(Debug, Clone)]
enum CallScript {
    Return(Bytes),
    Revert(String),
}

#[derive(Debug, Default)]
struct MockState {
    block_number: u64,
    auto_mine: bool,
    responses: HashMap<(Address, [u8; 4]), CallScript>,
    call_counts: HashMap<(Address, [u8; 4]), usize>,
    balances: HashMap<Address, U256>,
    receipts: HashMap<B256, TransactionReceipt>,
    sent: Vec<SignedTransaction>,
    revert_patterns: Vec<(Bytes, String)>,
    log_patterns: Vec<(Bytes, Vec<LogEntry>)>,
}

/// Scripted [`Provider`] double
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A provider at block 100 that auto-mines every broadcast
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                block_number: 100,
                auto_mine: true,
                ..MockState::default()
            }),
        }
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = block;
    }

    /// Disable auto-mining; broadcasts then stay unmined until a receipt
    /// is staged explicitly
    pub fn set_auto_mine(&self, enabled: bool) {
        self.state.lock().unwrap().auto_mine = enabled;
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert(address, balance);
    }

    /// Script a successful return for calls to `(to, selector)`
    pub fn respond(&self, to: Address, selector: [u8; 4], ret: impl Into<Bytes>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert((to, selector), CallScript::Return(ret.into()));
    }

    /// Script a revert for calls to `(to, selector)`
    pub fn respond_revert(&self, to: Address, selector: [u8; 4]) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert((to, selector), CallScript::Revert("execution reverted".to_string()));
    }

    /// How many calls hit `(to, selector)`
    pub fn call_count(&self, to: Address, selector: [u8; 4]) -> usize {
        *self
            .state
            .lock()
            .unwrap()
            .call_counts
            .get(&(to, selector))
            .unwrap_or(&0)
    }

    /// Stage a receipt for a known hash
    pub fn stage_receipt(&self, receipt: TransactionReceipt) {
        let mut state = self.state.lock().unwrap();
        state.receipts.insert(receipt.transaction_hash, receipt);
    }

    /// Auto-mined sends whose signed payload contains `pattern` revert
    /// with `reason`. An empty pattern matches every send.
    pub fn fail_sends_matching(&self, pattern: impl Into<Bytes>, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .revert_patterns
            .push((pattern.into(), reason.to_string()));
    }

    /// Auto-mined sends whose signed payload contains `pattern` carry
    /// `logs` in their receipt. An empty pattern matches every send.
    pub fn logs_for_sends_matching(&self, pattern: impl Into<Bytes>, logs: Vec<LogEntry>) {
        self.state
            .lock()
            .unwrap()
            .log_patterns
            .push((pattern.into(), logs));
    }

    /// Every broadcast recorded so far, in submission order
    pub fn sent(&self) -> Vec<SignedTransaction> {
        self.state.lock().unwrap().sent.clone()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[async_trait]
impl Provider for MockProvider {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let mut selector = [0u8; 4];
        if data.len() >= 4 {
            selector.copy_from_slice(&data[..4]);
        }

        let mut state = self.state.lock().unwrap();
        *state.call_counts.entry((to, selector)).or_insert(0) += 1;

        match state.responses.get(&(to, selector)) {
            Some(CallScript::Return(ret)) => Ok(ret.clone()),
            Some(CallScript::Revert(reason)) => Err(ProviderError::Rpc {
                message: reason.clone(),
            }),
            None => Err(ProviderError::Rpc {
                message: format!("no response scripted for {to} selector 0x{}", hex::encode(selector)),
            }),
        }
    }

    async fn send_transaction(&self, tx: SignedTransaction) -> Result<B256> {
        let mut state = self.state.lock().unwrap();
        let hash = tx.hash;
        state.sent.push(tx.clone());

        if state.auto_mine {
            state.block_number += 1;
            let reason = state
                .revert_patterns
                .iter()
                .find(|(pattern, _)| contains(&tx.raw, pattern))
                .map(|(_, reason)| reason.clone());
            let logs = state
                .log_patterns
                .iter()
                .find(|(pattern, _)| contains(&tx.raw, pattern))
                .map(|(_, logs)| logs.clone())
                .unwrap_or_default();
            let receipt = TransactionReceipt {
                transaction_hash: hash,
                status: reason.is_none(),
                block_number: state.block_number,
                logs,
                revert_reason: reason,
            };
            state.receipts.insert(hash, receipt);
        }

        Ok(hash)
    }

    async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(&address)
            .copied()
            .unwrap_or(U256::ZERO))
    }
}

/// Recording [`Signer`] double. The signed payload embeds the request
/// fields plus a counter, so hashes are unique and calldata remains
/// visible to the pattern matchers above.
pub struct MockSigner {
    address: Address,
    requests: Mutex<Vec<TransactionRequest>>,
}

impl MockSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request signed so far, in signing order
    pub fn requests(&self) -> Vec<TransactionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<SignedTransaction> {
        let mut requests = self.requests.lock().unwrap();
        let counter = requests.len() as u64;
        requests.push(tx.clone());

        let mut raw = Vec::new();
        raw.extend_from_slice(tx.from.as_slice());
        raw.extend_from_slice(tx.to.as_slice());
        raw.extend_from_slice(&tx.value.to_be_bytes::<32>());
        raw.extend_from_slice(&tx.gas_limit.to_be_bytes());
        raw.extend_from_slice(&counter.to_be_bytes());
        raw.extend_from_slice(&tx.data);

        let hash = keccak256(&raw);
        Ok(SignedTransaction {
            raw: raw.into(),
            hash,
        })
    }
}
