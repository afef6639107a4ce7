//! Scripted in-memory transport
//!
//! Responses are keyed by contract address and function selector. Calls
//! without a scripted response revert; gas estimates default to
//! `DEFAULT_GAS_ESTIMATE`. Every broadcast is recorded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use fbcash_core::NodeError;

use crate::transport::{CallRequest, ChainTransport};
use crate::Result;

pub const DEFAULT_GAS_ESTIMATE: u64 = 100_000;

type Key = (Address, [u8; 4]);

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Revert(String),
}

/// A transaction the mock was asked to broadcast
#[derive(Debug, Clone)]
pub struct Submission {
    pub request: CallRequest,
    pub gas_limit: u64,
}

#[derive(Default)]
struct MockState {
    calls: HashMap<Key, Reply<Bytes>>,
    estimates: HashMap<Key, Reply<u64>>,
    call_log: Vec<CallRequest>,
    estimate_count: usize,
    submissions: Vec<Submission>,
}

#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Script raw ABI-encoded return data for `C` on `to`
    pub fn on_call<C: SolCall>(&self, to: Address, returns: impl Into<Bytes>) {
        self.state()
            .calls
            .insert((to, C::SELECTOR), Reply::Ok(returns.into()));
    }

    /// Script a return made of static 32-byte words (uints, addresses, bools)
    pub fn on_call_words<C: SolCall>(&self, to: Address, words: &[U256]) {
        let data: Vec<u8> = words
            .iter()
            .flat_map(|w| w.to_be_bytes::<32>())
            .collect();
        self.on_call::<C>(to, data);
    }

    pub fn on_call_u256<C: SolCall>(&self, to: Address, value: U256) {
        self.on_call_words::<C>(to, &[value]);
    }

    pub fn revert_call<C: SolCall>(&self, to: Address, reason: &str) {
        self.state()
            .calls
            .insert((to, C::SELECTOR), Reply::Revert(reason.to_string()));
    }

    pub fn on_estimate<C: SolCall>(&self, to: Address, gas: u64) {
        self.state()
            .estimates
            .insert((to, C::SELECTOR), Reply::Ok(gas));
    }

    pub fn revert_estimate<C: SolCall>(&self, to: Address, reason: &str) {
        self.state()
            .estimates
            .insert((to, C::SELECTOR), Reply::Revert(reason.to_string()));
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state().submissions.clone()
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.state().call_log.clone()
    }

    pub fn estimate_count(&self) -> usize {
        self.state().estimate_count
    }
}

fn key(request: &CallRequest) -> Key {
    (request.to, request.selector().unwrap_or_default())
}

#[async_trait]
impl ChainTransport for MockTransport {
    async fn call(&self, request: &CallRequest) -> Result<Bytes> {
        let mut state = self.state();
        state.call_log.push(request.clone());
        match state.calls.get(&key(request)) {
            Some(Reply::Ok(data)) => Ok(data.clone()),
            Some(Reply::Revert(reason)) => Err(NodeError::CallReverted {
                method: String::new(),
                reason: reason.clone(),
            }),
            None => Err(NodeError::CallReverted {
                method: String::new(),
                reason: "execution reverted".to_string(),
            }),
        }
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        let mut state = self.state();
        state.estimate_count += 1;
        match state.estimates.get(&key(request)) {
            Some(Reply::Ok(gas)) => Ok(*gas),
            Some(Reply::Revert(reason)) => Err(NodeError::CallReverted {
                method: String::new(),
                reason: reason.clone(),
            }),
            None => Ok(DEFAULT_GAS_ESTIMATE),
        }
    }

    async fn send_transaction(&self, request: &CallRequest, gas_limit: u64) -> Result<TxHash> {
        let mut state = self.state();
        state.submissions.push(Submission {
            request: request.clone(),
            gas_limit,
        });
        let n = state.submissions.len() as u64;
        Ok(B256::left_padding_from(&n.to_be_bytes()))
    }
}
