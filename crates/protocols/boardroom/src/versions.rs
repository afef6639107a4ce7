//! Per-generation boardroom implementations
//!
//! V1 names its methods differently (`getShareOf`, `getCashEarningsOf`,
//! `claimDividends`); V2 and the latest generation share one method set.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use evm_node_client::bindings::{IBoardroom, IBoardroomV1};
use evm_node_client::{ContractHandle, ContractRegistry, GasPlanner, SubmittedTx};
use fbcash_core::{BoardroomVersion, Error, ProtocolError};

/// What every boardroom generation can do
#[async_trait]
pub trait Boardroom: Send + Sync {
    fn version(&self) -> BoardroomVersion;

    fn contract(&self) -> &ContractHandle;

    /// Shares staked by `account`
    async fn staked_balance(&self, account: Address) -> Result<U256, Error>;

    /// Cash earned and not yet claimed by `account`
    async fn earned(&self, account: Address) -> Result<U256, Error>;

    async fn stake(&self, planner: &GasPlanner, amount: U256) -> Result<SubmittedTx, Error>;

    async fn withdraw(&self, planner: &GasPlanner, amount: U256) -> Result<SubmittedTx, Error>;

    /// Claim earned cash
    async fn harvest(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error>;

    /// Withdraw everything and claim
    async fn exit(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error>;
}

/// First-generation boardroom
#[derive(Debug, Clone)]
pub struct LegacyBoardroom {
    contract: ContractHandle,
}

impl LegacyBoardroom {
    pub fn new(contract: ContractHandle) -> Self {
        Self { contract }
    }
}

#[async_trait]
impl Boardroom for LegacyBoardroom {
    fn version(&self) -> BoardroomVersion {
        BoardroomVersion::V1
    }

    fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    async fn staked_balance(&self, account: Address) -> Result<U256, Error> {
        let ret = self
            .contract
            .view(&IBoardroomV1::getShareOfCall { account })
            .await?;
        Ok(ret.shares)
    }

    async fn earned(&self, account: Address) -> Result<U256, Error> {
        let ret = self
            .contract
            .view(&IBoardroomV1::getCashEarningsOfCall { account })
            .await?;
        Ok(ret.earnings)
    }

    async fn stake(&self, planner: &GasPlanner, amount: U256) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroomV1::stakeCall { amount })
            .await
    }

    async fn withdraw(&self, planner: &GasPlanner, amount: U256) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroomV1::withdrawCall { amount })
            .await
    }

    async fn harvest(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroomV1::claimDividendsCall {})
            .await
    }

    async fn exit(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroomV1::exitCall {})
            .await
    }
}

/// Second-generation and latest boardrooms
#[derive(Debug, Clone)]
pub struct StandardBoardroom {
    version: BoardroomVersion,
    contract: ContractHandle,
}

impl StandardBoardroom {
    pub fn new(version: BoardroomVersion, contract: ContractHandle) -> Self {
        debug_assert!(version != BoardroomVersion::V1);
        Self { version, contract }
    }
}

#[async_trait]
impl Boardroom for StandardBoardroom {
    fn version(&self) -> BoardroomVersion {
        self.version
    }

    fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    async fn staked_balance(&self, account: Address) -> Result<U256, Error> {
        let ret = self
            .contract
            .view(&IBoardroom::balanceOfCall { account })
            .await?;
        Ok(ret.balance)
    }

    async fn earned(&self, account: Address) -> Result<U256, Error> {
        let ret = self.contract.view(&IBoardroom::earnedCall { account }).await?;
        Ok(ret.reward)
    }

    async fn stake(&self, planner: &GasPlanner, amount: U256) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroom::stakeCall { amount })
            .await
    }

    async fn withdraw(&self, planner: &GasPlanner, amount: U256) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroom::withdrawCall { amount })
            .await
    }

    async fn harvest(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroom::claimRewardCall {})
            .await
    }

    async fn exit(&self, planner: &GasPlanner) -> Result<SubmittedTx, Error> {
        planner
            .submit(&self.contract, &IBoardroom::exitCall {})
            .await
    }
}

/// The implementation for `version`, bound like the rest of the registry
pub fn boardroom_for(
    registry: &ContractRegistry,
    version: BoardroomVersion,
) -> Result<Box<dyn Boardroom>, ProtocolError> {
    let contract = registry.contract(version.contract_name())?.clone();
    Ok(match version {
        BoardroomVersion::V1 => Box::new(LegacyBoardroom::new(contract)),
        BoardroomVersion::V2 | BoardroomVersion::Latest => {
            Box::new(StandardBoardroom::new(version, contract))
        }
    })
}
