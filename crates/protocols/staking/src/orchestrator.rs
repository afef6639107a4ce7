//! Pool reads and transactions by contract name

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use evm_node_client::bindings::{IAcceleratorPool, IEthPool, IRewardPool};
use evm_node_client::{ContractHandle, ContractRegistry, GasPlanner, SubmittedTx};
use fbcash_core::{Amount, Error, PoolDescriptor, ProtocolError, PROTOCOL_DECIMALS};
use futures::future::join_all;

use crate::state::{Bank, PoolPosition};

/// Deposit token name of pools that take the native coin
pub const NATIVE_TOKEN: &str = "ETH";

/// Staking against the configured pools
pub struct StakingOrchestrator<'a> {
    registry: &'a ContractRegistry,
    pools: &'a [PoolDescriptor],
}

impl<'a> StakingOrchestrator<'a> {
    pub fn new(registry: &'a ContractRegistry, pools: &'a [PoolDescriptor]) -> Self {
        Self { registry, pools }
    }

    pub fn pools(&self) -> &[PoolDescriptor] {
        self.pools
    }

    /// Descriptor of the pool deployed as `contract`
    pub fn pool(&self, contract: &str) -> Result<&'a PoolDescriptor, ProtocolError> {
        self.pools
            .iter()
            .find(|p| p.contract == contract)
            .ok_or_else(|| ProtocolError::UnknownContract {
                name: contract.to_string(),
            })
    }

    fn handle(&self, pool: &PoolDescriptor) -> Result<&'a ContractHandle, ProtocolError> {
        self.registry.contract(&pool.contract)
    }

    fn decimals_of(&self, symbol: &str) -> Result<u8, ProtocolError> {
        if symbol == NATIVE_TOKEN {
            return Ok(PROTOCOL_DECIMALS);
        }
        Ok(self.registry.token(symbol)?.decimals())
    }

    fn native(&self, contract: &str) -> Result<&'a PoolDescriptor, ProtocolError> {
        let pool = self.pool(contract)?;
        if pool.deposit_token != NATIVE_TOKEN {
            return Err(ProtocolError::ActionNotAllowed {
                reason: format!("{} does not take {} deposits", pool.name, NATIVE_TOKEN),
            });
        }
        Ok(pool)
    }

    fn accelerator(&self, contract: &str) -> Result<&'a PoolDescriptor, ProtocolError> {
        let pool = self.pool(contract)?;
        if !pool.is_accelerator() {
            return Err(ProtocolError::ActionNotAllowed {
                reason: format!("{} is not an accelerator pool", pool.name),
            });
        }
        Ok(pool)
    }

    // ---- reads ----

    /// Reward earned in `contract`, zero if the pool cannot answer
    pub async fn earned(&self, contract: &str, account: Address) -> Result<Amount, Error> {
        let pool = self.pool(contract)?;
        let decimals = self.decimals_of(&pool.earn_token)?;
        let raw = read_or_zero(
            self.handle(pool)?,
            &IRewardPool::earnedCall { account },
            |r| r.reward,
        )
        .await?;
        Ok(Amount::new(raw, decimals))
    }

    /// Deposit token staked in `contract`, zero if the pool cannot answer
    pub async fn staked_balance(&self, contract: &str, account: Address) -> Result<Amount, Error> {
        let pool = self.pool(contract)?;
        let decimals = self.decimals_of(&pool.deposit_token)?;
        let raw = read_or_zero(
            self.handle(pool)?,
            &IRewardPool::balanceOfCall { account },
            |r| r.balance,
        )
        .await?;
        Ok(Amount::new(raw, decimals))
    }

    pub async fn accelerator_earned(
        &self,
        contract: &str,
        account: Address,
    ) -> Result<Amount, Error> {
        let pool = self.accelerator(contract)?;
        let raw = read_or_zero(
            self.handle(pool)?,
            &IAcceleratorPool::acceleratorEarnedCall { account },
            |r| r.reward,
        )
        .await?;
        Ok(Amount::new(raw, PROTOCOL_DECIMALS))
    }

    pub async fn accelerator_staked_balance(
        &self,
        contract: &str,
        account: Address,
    ) -> Result<Amount, Error> {
        let pool = self.accelerator(contract)?;
        let decimals = match pool.accelerator_token() {
            Some(symbol) => self.decimals_of(symbol)?,
            None => PROTOCOL_DECIMALS,
        };
        let raw = read_or_zero(
            self.handle(pool)?,
            &IAcceleratorPool::balanceFBGOfCall { account },
            |r| r.balance,
        )
        .await?;
        Ok(Amount::new(raw, decimals))
    }

    // ---- transactions ----

    /// Deposit `amount` of the pool's deposit token
    pub async fn stake(
        &self,
        planner: &GasPlanner,
        contract: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let pool = self.pool(contract)?;
        let amount = self.base_units(&pool.deposit_token, amount)?;
        planner
            .submit(self.handle(pool)?, &IRewardPool::stakeCall { amount })
            .await
    }

    pub async fn unstake(
        &self,
        planner: &GasPlanner,
        contract: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let pool = self.pool(contract)?;
        let amount = self.base_units(&pool.deposit_token, amount)?;
        planner
            .submit(self.handle(pool)?, &IRewardPool::withdrawCall { amount })
            .await
    }

    /// Claim the pool reward
    pub async fn harvest(&self, planner: &GasPlanner, contract: &str) -> Result<SubmittedTx, Error> {
        let pool = self.pool(contract)?;
        planner
            .submit(self.handle(pool)?, &IRewardPool::getRewardCall {})
            .await
    }

    /// Withdraw the whole deposit and claim
    pub async fn exit(&self, planner: &GasPlanner, contract: &str) -> Result<SubmittedTx, Error> {
        let pool = self.pool(contract)?;
        planner
            .submit(self.handle(pool)?, &IRewardPool::exitCall {})
            .await
    }

    /// Deposit `amount` of the native coin into a native-coin pool
    pub async fn stake_eth(
        &self,
        planner: &GasPlanner,
        contract: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let pool = self.native(contract)?;
        let value = self.base_units(NATIVE_TOKEN, amount)?;
        planner
            .submit_with_value(self.handle(pool)?, &IEthPool::stakeCall {}, value)
            .await
    }

    pub async fn unstake_eth(
        &self,
        planner: &GasPlanner,
        contract: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let pool = self.native(contract)?;
        let amount = self.base_units(NATIVE_TOKEN, amount)?;
        planner
            .submit(self.handle(pool)?, &IEthPool::withdrawCall { amount })
            .await
    }

    pub async fn stake_accelerator(
        &self,
        planner: &GasPlanner,
        contract: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let pool = self.accelerator(contract)?;
        let amount = self.accelerator_units(pool, amount)?;
        planner
            .submit(self.handle(pool)?, &IAcceleratorPool::stakeFBGCall { amount })
            .await
    }

    pub async fn unstake_accelerator(
        &self,
        planner: &GasPlanner,
        contract: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let pool = self.accelerator(contract)?;
        let amount = self.accelerator_units(pool, amount)?;
        planner
            .submit(
                self.handle(pool)?,
                &IAcceleratorPool::withdrawFBGCall { amount },
            )
            .await
    }

    fn base_units(&self, symbol: &str, amount: &Amount) -> Result<U256, ProtocolError> {
        let decimals = self.decimals_of(symbol)?;
        if amount.decimals() != decimals {
            return Err(ProtocolError::InvalidAmount {
                message: format!(
                    "{} uses {} decimals, got {}",
                    symbol,
                    decimals,
                    amount.decimals()
                ),
            });
        }
        Ok(amount.raw())
    }

    fn accelerator_units(
        &self,
        pool: &PoolDescriptor,
        amount: &Amount,
    ) -> Result<U256, ProtocolError> {
        match pool.accelerator_token() {
            Some(symbol) => self.base_units(symbol, amount),
            None => Ok(amount.raw()),
        }
    }

    // ---- listing ----

    /// Pools to show, ordered by `sort`.
    ///
    /// Finished pools are only listed for an unlocked account that still
    /// has a stake in them.
    pub async fn list_banks(&self, account: Option<Address>) -> Result<Vec<Bank>, Error> {
        let mut banks = Vec::with_capacity(self.pools.len());

        for pool in self.pools {
            if pool.finished {
                let Some(account) = account else {
                    continue;
                };
                if self.staked_balance(&pool.contract, account).await?.is_zero() {
                    tracing::debug!("Hiding finished pool {} without stake", pool.name);
                    continue;
                }
            }
            banks.push(Bank {
                descriptor: pool.clone(),
                address: self.handle(pool)?.address(),
            });
        }

        banks.sort_by_key(|b| b.descriptor.sort);
        Ok(banks)
    }

    /// Positions of `account` in every pool, read concurrently
    pub async fn pool_positions(&self, account: Address) -> Result<Vec<PoolPosition>, Error> {
        let reads = self.pools.iter().map(|pool| self.position(pool, account));
        join_all(reads).await.into_iter().collect()
    }

    async fn position(&self, pool: &PoolDescriptor, account: Address) -> Result<PoolPosition, Error> {
        let (earned, staked) = futures::try_join!(
            self.earned(&pool.contract, account),
            self.staked_balance(&pool.contract, account),
        )?;

        let (accelerator_earned, accelerator_staked) = if pool.is_accelerator() {
            let (e, s) = futures::try_join!(
                self.accelerator_earned(&pool.contract, account),
                self.accelerator_staked_balance(&pool.contract, account),
            )?;
            (Some(e), Some(s))
        } else {
            (None, None)
        };

        Ok(PoolPosition {
            pool: pool.contract.clone(),
            earned,
            staked,
            accelerator_earned,
            accelerator_staked,
        })
    }
}

/// View call whose revert or garbage answer reads as zero. Transport
/// failures still propagate.
async fn read_or_zero<C: SolCall>(
    handle: &ContractHandle,
    call: &C,
    extract: impl FnOnce(C::Return) -> U256,
) -> Result<U256, Error> {
    match handle.view(call).await {
        Ok(ret) => Ok(extract(ret)),
        Err(e) if e.is_revert() => {
            tracing::warn!(
                "Failed to call {} on pool {}: {}",
                C::SIGNATURE,
                handle.address(),
                e
            );
            Ok(U256::ZERO)
        }
        Err(e) => Err(e.into()),
    }
}
