//! evm-node-client: JSON-RPC access to the FBCash contracts
//!
//! This crate provides the transport seam, the contract registry, token
//! handles and the gas planner every mutating call goes through. The
//! production transport wraps an alloy provider with per-call timeouts.

pub mod bindings;
pub mod gas;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod registry;
pub mod token;
pub mod transport;

use std::future::Future;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::{TransportError, TransportResult};
use async_trait::async_trait;
use fbcash_core::{NodeConfig, NodeError};

pub use gas::{plan, GasPlan, GasPlanner, SubmittedTx};
pub use registry::{Binding, ContractHandle, ContractRegistry, Signer};
pub use token::TokenHandle;
pub use transport::{CallRequest, ChainTransport};

/// Result type for node client operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// EVM node client with a per-request timeout
#[derive(Clone)]
pub struct NodeClient<P> {
    provider: P,
    config: NodeConfig,
}

/// Read-only client over HTTP
pub fn connect_http(
    config: NodeConfig,
) -> Result<NodeClient<impl Provider + Clone + 'static>> {
    let url = config.url.parse().map_err(|e| NodeError::Unreachable {
        url: format!("{}: {}", config.url, e),
    })?;
    let provider = ProviderBuilder::new().on_http(url);
    Ok(NodeClient { provider, config })
}

/// Signing client over HTTP; the wallet fills and signs transactions
pub fn connect_http_with_wallet(
    config: NodeConfig,
    wallet: EthereumWallet,
) -> Result<NodeClient<impl Provider + Clone + 'static>> {
    let url = config.url.parse().map_err(|e| NodeError::Unreachable {
        url: format!("{}: {}", config.url, e),
    })?;
    let provider = ProviderBuilder::new().wallet(wallet).on_http(url);
    Ok(NodeClient { provider, config })
}

impl<P: Provider> NodeClient<P> {
    /// Get the underlying provider (for advanced usage)
    pub fn inner(&self) -> &P {
        &self.provider
    }

    /// Get the current node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    /// Get current block number
    pub async fn current_block(&self) -> Result<u64> {
        timed_request(self.timeout(), self.provider.get_block_number()).await
    }

    /// Check if node is online
    pub async fn is_online(&self) -> bool {
        self.current_block().await.is_ok()
    }

    /// Fail unless the node serves the configured chain
    pub async fn verify_chain(&self) -> Result<()> {
        let chain_id = timed_request(self.timeout(), self.provider.get_chain_id()).await?;
        if chain_id != self.config.chain_id {
            return Err(NodeError::ApiError {
                message: format!(
                    "Node serves chain {} but deployments are for chain {}",
                    chain_id, self.config.chain_id
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<P: Provider + 'static> ChainTransport for NodeClient<P> {
    async fn call(&self, request: &CallRequest) -> Result<Bytes> {
        let tx = request.to_transaction_request();
        timed_request(self.timeout(), async { self.provider.call(&tx).await }).await
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        let tx = request.to_transaction_request();
        timed_request(self.timeout(), async {
            self.provider.estimate_gas(&tx).await
        })
        .await
    }

    async fn send_transaction(&self, request: &CallRequest, gas_limit: u64) -> Result<TxHash> {
        let tx = request.to_transaction_request().gas_limit(gas_limit);
        let pending = timed_request(self.timeout(), self.provider.send_transaction(tx)).await?;
        Ok(*pending.tx_hash())
    }
}

/// Wrap a node request with the configured timeout.
///
/// Only error responses that report an EVM revert count as reverts;
/// other node errors and transport failures are API errors.
async fn timed_request<T>(
    timeout: Duration,
    fut: impl Future<Output = TransportResult<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| NodeError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(classify_transport_error)
}

/// JSON-RPC error code geth and most clients use for reverts
const EXECUTION_REVERTED_CODE: i64 = 3;

fn is_execution_revert(code: i64, message: &str) -> bool {
    code == EXECUTION_REVERTED_CODE || message.to_lowercase().contains("execution reverted")
}

fn classify_transport_error(err: TransportError) -> NodeError {
    match err.as_error_resp() {
        Some(payload) if is_execution_revert(payload.code, &payload.message) => {
            NodeError::CallReverted {
                method: String::new(),
                reason: payload.message.to_string(),
            }
        }
        _ => NodeError::ApiError {
            message: err.to_string(),
        },
    }
}
