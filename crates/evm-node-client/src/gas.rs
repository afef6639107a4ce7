//! Gas planning for state-mutating calls
//!
//! Nothing is broadcast without a successful estimate for the exact call:
//! a failed estimate means the transaction would revert on chain.

use alloy::primitives::{TxHash, U256};
use alloy::sol_types::SolCall;
use fbcash_core::{Error, GasMultiplier, TxError};
use serde::Serialize;

use crate::registry::ContractHandle;

/// Estimated gas and the padded limit actually submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasPlan {
    pub estimated: u64,
    pub padded: u64,
}

/// `padded = ceil(estimated * multiplier)`
pub fn plan(estimated: u64, multiplier: GasMultiplier) -> GasPlan {
    GasPlan {
        estimated,
        padded: multiplier.apply(estimated),
    }
}

/// A broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedTx {
    pub hash: TxHash,
    pub method: String,
    pub gas: GasPlan,
}

/// Estimates, pads and submits mutating calls
#[derive(Debug, Clone, Copy)]
pub struct GasPlanner {
    multiplier: GasMultiplier,
}

impl GasPlanner {
    pub fn new(multiplier: GasMultiplier) -> Self {
        Self { multiplier }
    }

    pub fn multiplier(&self) -> GasMultiplier {
        self.multiplier
    }

    pub fn plan(&self, estimated: u64) -> GasPlan {
        plan(estimated, self.multiplier)
    }

    /// Estimate gas for `call` on `handle` and, only if that succeeds,
    /// submit it with the padded limit.
    pub async fn submit<C: SolCall>(
        &self,
        handle: &ContractHandle,
        call: &C,
    ) -> Result<SubmittedTx, Error> {
        self.submit_with_value(handle, call, U256::ZERO).await
    }

    /// Like [`Self::submit`], sending `value` of the native coin along.
    /// The estimate covers the value too.
    pub async fn submit_with_value<C: SolCall>(
        &self,
        handle: &ContractHandle,
        call: &C,
        value: U256,
    ) -> Result<SubmittedTx, Error> {
        let method = handle.method_label::<C>();
        let signer = handle
            .binding()
            .signer()
            .ok_or_else(|| TxError::SignerRequired {
                method: method.clone(),
            })?;

        let request = handle.request(call).with_value(value);
        let estimated = signer
            .transport()
            .estimate_gas(&request)
            .await
            .map_err(|e| {
                tracing::warn!("Gas estimation failed for {}: {}", method, e);
                TxError::TransactionWouldRevert {
                    method: method.clone(),
                    reason: e.to_string(),
                }
            })?;

        let gas = self.plan(estimated);
        tracing::info!(
            "Gas for {}: estimated {} -> limit {}",
            method,
            gas.estimated,
            gas.padded
        );

        let hash = signer
            .transport()
            .send_transaction(&request, gas.padded)
            .await
            .map_err(|e| TxError::SubmissionFailed {
                message: format!("{}: {}", method, e),
            })?;

        tracing::info!("Submitted {} as {}", method, hash);
        Ok(SubmittedTx { hash, method, gas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{IEthPool, IRewardPool};
    use crate::mock::MockTransport;
    use crate::registry::{Binding, Signer};
    use alloy::primitives::{address, Address};
    use std::sync::Arc;

    const POOL: Address = address!("0000000000000000000000000000000000000b01");
    const ALICE: Address = address!("000000000000000000000000000000000000a11c");

    fn pool_handle(mock: &Arc<MockTransport>, signed: bool) -> ContractHandle {
        let binding = if signed {
            Binding::Signer(Signer::new(ALICE, mock.clone()))
        } else {
            Binding::Provider(mock.clone())
        };
        ContractHandle::new("Pool", POOL, Arc::new(serde_json::Value::Null), binding)
    }

    #[test]
    fn test_plan() {
        let m = GasMultiplier::from_f64(1.1).unwrap();
        assert_eq!(plan(100_000, m).padded, 110_000);
        assert_eq!(plan(100_000, GasMultiplier::ONE).padded, 100_000);
        assert_eq!(plan(0, m).padded, 0);
        assert_eq!(plan(u64::MAX, m).padded, u64::MAX);
    }

    #[tokio::test]
    async fn test_submit_uses_padded_limit() {
        let mock = MockTransport::new();
        mock.on_estimate::<IRewardPool::stakeCall>(POOL, 50_000);
        let planner = GasPlanner::new(GasMultiplier::from_f64(1.7).unwrap());

        let tx = planner
            .submit(
                &pool_handle(&mock, true),
                &IRewardPool::stakeCall {
                    amount: U256::from(10u8),
                },
            )
            .await
            .unwrap();

        assert_eq!(tx.gas, GasPlan { estimated: 50_000, padded: 85_000 });
        assert_eq!(tx.method, "Pool.stake(uint256)");
        let submissions = mock.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].gas_limit, 85_000);
        assert_eq!(submissions[0].request.from, Some(ALICE));
    }

    #[tokio::test]
    async fn test_submit_with_value_estimates_and_sends_value() {
        let mock = MockTransport::new();
        mock.on_estimate::<IEthPool::stakeCall>(POOL, 40_000);
        let planner = GasPlanner::new(GasMultiplier::from_f64(1.1).unwrap());
        let value = U256::from(10u64).pow(U256::from(18));

        let tx = planner
            .submit_with_value(&pool_handle(&mock, true), &IEthPool::stakeCall {}, value)
            .await
            .unwrap();

        assert_eq!(tx.gas.padded, 44_000);
        let submissions = mock.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].request.value, value);
        assert_eq!(
            submissions[0].request.selector(),
            Some(IEthPool::stakeCall::SELECTOR)
        );
    }

    #[tokio::test]
    async fn test_failed_estimate_submits_nothing() {
        let mock = MockTransport::new();
        mock.revert_estimate::<IRewardPool::exitCall>(POOL, "nothing staked");
        let planner = GasPlanner::new(GasMultiplier::ONE);

        let err = planner
            .submit(&pool_handle(&mock, true), &IRewardPool::exitCall {})
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "transaction_would_revert");
        assert!(mock.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_provider_binding_cannot_submit() {
        let mock = MockTransport::new();
        let planner = GasPlanner::new(GasMultiplier::ONE);

        let err = planner
            .submit(&pool_handle(&mock, false), &IRewardPool::getRewardCall {})
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "signer_required");
        assert_eq!(mock.estimate_count(), 0);
        assert!(mock.submissions().is_empty());
    }
}
