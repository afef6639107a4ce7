//! Transport seam between contract handles and the network
//!
//! Contract handles only ever talk to a `ChainTransport`. The production
//! implementation is [`crate::NodeClient`]; tests use the scripted
//! transport from the `mock` module.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::Result;

/// A contract call as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
}

impl CallRequest {
    pub fn new(to: Address, input: impl Into<Bytes>) -> Self {
        Self {
            from: None,
            to,
            input: input.into(),
            value: U256::ZERO,
        }
    }

    pub fn from_account(mut self, from: Option<Address>) -> Self {
        self.from = from;
        self
    }

    /// Native coin sent along with the call
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Function selector, if the input carries one
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }

    pub fn to_transaction_request(&self) -> TransactionRequest {
        let tx = TransactionRequest::default()
            .to(self.to)
            .input(self.input.clone().into())
            .value(self.value);
        match self.from {
            Some(from) => tx.from(from),
            None => tx,
        }
    }
}

/// Asynchronous access to an EVM node
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, request: &CallRequest) -> Result<Bytes>;

    /// `eth_estimateGas` for the exact request
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64>;

    /// Sign (wallet-side) and broadcast with an explicit gas limit.
    /// Never retried by the client.
    async fn send_transaction(&self, request: &CallRequest, gas_limit: u64) -> Result<TxHash>;
}
