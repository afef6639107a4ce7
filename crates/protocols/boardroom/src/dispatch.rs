//! Version-agnostic boardroom access for the unlocked account

use alloy::primitives::{Address, U256};
use evm_node_client::{ContractRegistry, GasPlanner, SubmittedTx};
use fbcash_core::{Amount, BoardroomVersion, Error, ProtocolError, PROTOCOL_DECIMALS};

use crate::versions::{boardroom_for, Boardroom};

/// Routes boardroom operations to the generation the account resolved to.
///
/// Reads work on every generation. New stakes, withdrawals and claims are
/// only accepted on the latest one; a legacy position has to be closed
/// with [`BoardroomDispatcher::exit_legacy`] first.
pub struct BoardroomDispatcher {
    boardroom: Box<dyn Boardroom>,
    account: Address,
}

impl BoardroomDispatcher {
    pub fn new(registry: &ContractRegistry, version: BoardroomVersion) -> Result<Self, Error> {
        let account = registry.account().ok_or(ProtocolError::WalletLocked)?;
        let boardroom = boardroom_for(registry, version)?;
        Ok(Self { boardroom, account })
    }

    pub fn version(&self) -> BoardroomVersion {
        self.boardroom.version()
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn address(&self) -> Address {
        self.boardroom.contract().address()
    }

    pub async fn staked_balance(&self) -> Result<Amount, Error> {
        let raw = self.boardroom.staked_balance(self.account).await?;
        Ok(Amount::new(raw, PROTOCOL_DECIMALS))
    }

    pub async fn earned(&self) -> Result<Amount, Error> {
        let raw = self.boardroom.earned(self.account).await?;
        Ok(Amount::new(raw, PROTOCOL_DECIMALS))
    }

    pub async fn stake(&self, planner: &GasPlanner, amount: &Amount) -> Result<SubmittedTx, Error> {
        self.ensure_current()?;
        self.boardroom.stake(planner, share_units(amount)?).await
    }

    pub async fn withdraw(
        &self,
        planner: &GasPlanner,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        self.ensure_current()?;
        self.boardroom.withdraw(planner, share_units(amount)?).await
    }

    pub async fn harvest(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        self.ensure_current()?;
        self.boardroom.harvest(planner).await
    }

    pub async fn exit(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        self.ensure_current()?;
        self.boardroom.exit(planner).await
    }

    /// Leave a legacy boardroom. The only mutation a legacy generation takes.
    pub async fn exit_legacy(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        let version = self.version();
        if !version.is_legacy() {
            return Err(ProtocolError::ActionNotAllowed {
                reason: format!("boardroom {} is not a legacy generation", version),
            }
            .into());
        }
        tracing::info!("Exiting legacy boardroom {} for {}", version, self.account);
        self.boardroom.exit(planner).await
    }

    fn ensure_current(&self) -> Result<(), ProtocolError> {
        let version = self.version();
        if version.is_legacy() {
            return Err(ProtocolError::StaleBoardroomVersion {
                version: version.to_string(),
            });
        }
        Ok(())
    }
}

fn share_units(amount: &Amount) -> Result<U256, ProtocolError> {
    if amount.decimals() != PROTOCOL_DECIMALS {
        return Err(ProtocolError::InvalidAmount {
            message: format!(
                "share amounts use {} decimals, got {}",
                PROTOCOL_DECIMALS,
                amount.decimals()
            ),
        });
    }
    Ok(amount.raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use alloy::sol_types::SolCall;
    use evm_node_client::bindings::{IBoardroom, IBoardroomV1};
    use evm_node_client::mock::MockTransport;
    use fbcash_core::{GasMultiplier, TxError};

    fn planner() -> GasPlanner {
        GasPlanner::new(GasMultiplier::from_f64(1.7).unwrap())
    }

    #[test]
    fn test_requires_unlocked_wallet() {
        let mock = MockTransport::new();
        let registry = registry(&mock, false);
        match BoardroomDispatcher::new(&registry, BoardroomVersion::Latest) {
            Err(Error::Protocol(ProtocolError::WalletLocked)) => {}
            other => panic!("Expected WalletLocked, got: {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_stale_version_rejects_mutations() {
        let mock = MockTransport::new();
        let registry = registry(&mock, true);
        let planner = planner();

        for version in [BoardroomVersion::V1, BoardroomVersion::V2] {
            let dispatcher = BoardroomDispatcher::new(&registry, version).unwrap();
            let err = dispatcher
                .stake(&planner, &Amount::whole(1, PROTOCOL_DECIMALS))
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "stale_boardroom_version");
            assert!(dispatcher.harvest(&planner).await.is_err());
        }

        assert_eq!(mock.estimate_count(), 0);
        assert!(mock.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_reads_use_v1_methods() {
        let mock = MockTransport::new();
        mock.on_call_u256::<IBoardroomV1::getShareOfCall>(BOARDROOM1, U256::from(5u64));
        mock.on_call_u256::<IBoardroomV1::getCashEarningsOfCall>(BOARDROOM1, U256::from(2u64));
        let registry = registry(&mock, true);

        let dispatcher = BoardroomDispatcher::new(&registry, BoardroomVersion::V1).unwrap();
        assert_eq!(dispatcher.staked_balance().await.unwrap().raw(), U256::from(5u64));
        assert_eq!(dispatcher.earned().await.unwrap().raw(), U256::from(2u64));
    }

    #[tokio::test]
    async fn test_latest_harvest_calls_claim_reward() {
        let mock = MockTransport::new();
        mock.on_estimate::<IBoardroom::claimRewardCall>(BOARDROOM3, 100_000);
        let registry = registry(&mock, true);

        let dispatcher = BoardroomDispatcher::new(&registry, BoardroomVersion::Latest).unwrap();
        let tx = dispatcher.harvest(&planner()).await.unwrap();
        assert_eq!(tx.gas.padded, 170_000);

        let submissions = mock.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].request.to, BOARDROOM3);
        assert_eq!(
            submissions[0].request.selector(),
            Some(IBoardroom::claimRewardCall::SELECTOR)
        );
        assert_eq!(submissions[0].gas_limit, 170_000);
    }

    #[tokio::test]
    async fn test_exit_legacy_only_on_legacy() {
        let mock = MockTransport::new();
        let registry = registry(&mock, true);
        let planner = planner();

        let legacy = BoardroomDispatcher::new(&registry, BoardroomVersion::V2).unwrap();
        legacy.exit_legacy(&planner).await.unwrap();
        assert_eq!(mock.submissions()[0].request.to, BOARDROOM2);

        let latest = BoardroomDispatcher::new(&registry, BoardroomVersion::Latest).unwrap();
        match latest.exit_legacy(&planner).await.unwrap_err() {
            Error::Protocol(ProtocolError::ActionNotAllowed { .. }) => {}
            other => panic!("Expected ActionNotAllowed, got: {:?}", other),
        }
        assert_eq!(mock.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_estimate_aborts_stake() {
        let mock = MockTransport::new();
        mock.revert_estimate::<IBoardroom::stakeCall>(BOARDROOM3, "Boardroom: Cannot stake 0");
        let registry = registry(&mock, true);

        let dispatcher = BoardroomDispatcher::new(&registry, BoardroomVersion::Latest).unwrap();
        match dispatcher
            .stake(&planner(), &Amount::zero(PROTOCOL_DECIMALS))
            .await
            .unwrap_err()
        {
            Error::Transaction(TxError::TransactionWouldRevert { .. }) => {}
            other => panic!("Expected TransactionWouldRevert, got: {:?}", other),
        }
        assert!(mock.submissions().is_empty());
    }
}
