//! Version-agnostic entry point for user interfaces
//!
//! Every call works on the snapshot current when it started. Unlocking
//! rebinds the registry to the new signer and resolves the boardroom
//! generation for the account; only the latest unlock gets to commit
//! its resolution.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use boardroom::{resolve_version_or_latest, BoardroomDispatcher, ResolutionState};
use evm_node_client::{
    Binding, ChainTransport, ContractRegistry, GasPlanner, Signer, SubmittedTx,
};
use fbcash_core::{
    AllocationWindow, Amount, ClientConfig, Error, PoolDescriptor, PriceQuote,
    ProtocolError, TokenStat,
};
use staking::{Bank, PoolPosition, StakingOrchestrator};
use treasury::PriceOracleClient;

use crate::session::{Session, SessionState, Snapshot};

pub struct DomainFacade {
    config: ClientConfig,
    pools: Vec<PoolDescriptor>,
    planner: GasPlanner,
    provider: Arc<dyn ChainTransport>,
    state: SessionState,
}

impl DomainFacade {
    /// Validate `config` and build a read-only facade over `provider`
    pub fn new(config: ClientConfig, provider: Arc<dyn ChainTransport>) -> Result<Self, Error> {
        config.validate()?;
        let pools = config.pools()?;
        let planner = GasPlanner::new(config.gas_multiplier()?);
        let registry = ContractRegistry::from_config(&config, provider.clone());

        tracing::info!(
            "Loaded {} contracts and {} pools",
            registry.contract_names().count(),
            pools.len()
        );

        Ok(Self {
            config,
            pools,
            planner,
            provider,
            state: SessionState::new(registry),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn planner(&self) -> &GasPlanner {
        &self.planner
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.state.snapshot().await
    }

    pub async fn account(&self) -> Option<Address> {
        self.snapshot().await.session.account()
    }

    pub async fn is_unlocked(&self) -> bool {
        self.snapshot().await.session.is_unlocked()
    }

    pub async fn boardroom_resolution(&self) -> ResolutionState {
        self.snapshot().await.session.resolution
    }

    // ---- session ----

    /// Bind everything to `signer` and resolve its boardroom generation.
    ///
    /// Returns the resolution as committed, which stays `Unresolved` when
    /// another unlock or a disconnect overtook this one.
    pub async fn unlock(&self, signer: Signer) -> ResolutionState {
        let account = signer.account();
        let snapshot = self
            .state
            .install(|current, generation| {
                let mut registry = current.registry.clone();
                registry.connect(Binding::Signer(signer.clone()));
                Snapshot {
                    registry,
                    session: Session::unlocked(signer, generation),
                }
            })
            .await;
        tracing::info!(
            "Unlocked {} (generation {})",
            account,
            snapshot.session.generation
        );

        self.resolve_for(&snapshot, account).await
    }

    /// Back to read-only access
    pub async fn disconnect(&self) {
        let snapshot = self
            .state
            .install(|current, generation| {
                let mut registry = current.registry.clone();
                registry.disconnect(self.provider.clone());
                Snapshot {
                    registry,
                    session: Session::locked(generation),
                }
            })
            .await;
        tracing::info!(
            "Wallet disconnected (generation {})",
            snapshot.session.generation
        );
    }

    /// Resolve the boardroom generation again, e.g. after leaving a
    /// legacy boardroom. `Unresolved` means a newer unlock or a
    /// disconnect won and nothing was committed.
    pub async fn refresh_boardroom_version(&self) -> Result<ResolutionState, Error> {
        let snapshot = self.snapshot().await;
        let account = snapshot.session.account().ok_or(ProtocolError::WalletLocked)?;
        Ok(self.resolve_for(&snapshot, account).await)
    }

    async fn resolve_for(&self, snapshot: &Snapshot, account: Address) -> ResolutionState {
        let version = resolve_version_or_latest(&snapshot.registry, account).await;
        if self
            .state
            .commit_resolution(snapshot.session.generation, version)
            .await
        {
            ResolutionState::Resolved(version)
        } else {
            ResolutionState::Unresolved
        }
    }

    // ---- boardroom ----

    async fn boardroom(&self) -> Result<BoardroomDispatcher, Error> {
        let snapshot = self.snapshot().await;
        if !snapshot.session.is_unlocked() {
            return Err(ProtocolError::WalletLocked.into());
        }
        let version = snapshot.session.resolution.version()?;
        BoardroomDispatcher::new(&snapshot.registry, version)
    }

    pub async fn staked_shares_on_boardroom(&self) -> Result<Amount, Error> {
        self.boardroom().await?.staked_balance().await
    }

    pub async fn earnings_on_boardroom(&self) -> Result<Amount, Error> {
        self.boardroom().await?.earned().await
    }

    pub async fn stake_share_to_boardroom(&self, amount: &Amount) -> Result<SubmittedTx, Error> {
        self.boardroom().await?.stake(&self.planner, amount).await
    }

    pub async fn withdraw_share_from_boardroom(
        &self,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        self.boardroom().await?.withdraw(&self.planner, amount).await
    }

    pub async fn harvest_cash_from_boardroom(&self) -> Result<SubmittedTx, Error> {
        self.boardroom().await?.harvest(&self.planner).await
    }

    pub async fn exit_from_boardroom(&self) -> Result<SubmittedTx, Error> {
        self.boardroom().await?.exit(&self.planner).await
    }

    /// Leave the legacy boardroom the account resolved to. Follow with
    /// [`Self::refresh_boardroom_version`] once the exit is mined.
    pub async fn exit_legacy_boardroom(&self) -> Result<SubmittedTx, Error> {
        self.boardroom().await?.exit_legacy(&self.planner).await
    }

    // ---- staking ----

    fn unlocked_account(snapshot: &Snapshot) -> Result<Address, ProtocolError> {
        snapshot.session.account().ok_or(ProtocolError::WalletLocked)
    }

    pub async fn earned_from_bank(&self, pool: &str) -> Result<Amount, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .earned(pool, account)
            .await
    }

    pub async fn staked_balance_on_bank(&self, pool: &str) -> Result<Amount, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .staked_balance(pool, account)
            .await
    }

    pub async fn accelerator_earned_from_bank(&self, pool: &str) -> Result<Amount, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .accelerator_earned(pool, account)
            .await
    }

    pub async fn accelerator_staked_balance_on_bank(&self, pool: &str) -> Result<Amount, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .accelerator_staked_balance(pool, account)
            .await
    }

    pub async fn stake(&self, pool: &str, amount: &Amount) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .stake(&self.planner, pool, amount)
            .await
    }

    pub async fn unstake(&self, pool: &str, amount: &Amount) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .unstake(&self.planner, pool, amount)
            .await
    }

    pub async fn harvest(&self, pool: &str) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .harvest(&self.planner, pool)
            .await
    }

    pub async fn exit(&self, pool: &str) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .exit(&self.planner, pool)
            .await
    }

    /// Deposit `amount` of the native coin into `pool`
    pub async fn stake_eth(&self, pool: &str, amount: &Amount) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .stake_eth(&self.planner, pool, amount)
            .await
    }

    pub async fn unstake_eth(&self, pool: &str, amount: &Amount) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .unstake_eth(&self.planner, pool, amount)
            .await
    }

    pub async fn accelerator_stake(
        &self,
        pool: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .stake_accelerator(&self.planner, pool, amount)
            .await
    }

    pub async fn accelerator_unstake(
        &self,
        pool: &str,
        amount: &Amount,
    ) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .unstake_accelerator(&self.planner, pool, amount)
            .await
    }

    /// Pools to display for the current session
    pub async fn banks(&self) -> Result<Vec<Bank>, Error> {
        let snapshot = self.snapshot().await;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .list_banks(snapshot.session.account())
            .await
    }

    pub async fn pool_positions(&self) -> Result<Vec<PoolPosition>, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        StakingOrchestrator::new(&snapshot.registry, &self.pools)
            .pool_positions(account)
            .await
    }

    // ---- prices and treasury ----

    pub async fn spot_price(&self, symbol: &str) -> PriceQuote {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .spot_price(symbol)
            .await
    }

    pub async fn twap_estimated_price(&self, symbol: &str) -> PriceQuote {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .twap_estimated_price(symbol)
            .await
    }

    pub async fn cash_stat_from_spot(&self) -> Result<TokenStat, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .cash_stat_from_spot()
            .await
    }

    pub async fn cash_stat_in_estimated_twap(&self) -> Result<TokenStat, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .cash_stat_in_estimated_twap()
            .await
    }

    pub async fn bond_stat(&self) -> Result<TokenStat, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .bond_stat()
            .await
    }

    pub async fn share_stat(&self) -> Result<TokenStat, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .share_stat()
            .await
    }

    pub async fn cash_price_in_last_twap(&self) -> Result<U256, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .cash_price_in_last_twap()
            .await
    }

    pub async fn bond_oracle_price_in_last_twap(&self) -> Result<U256, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .bond_oracle_price_in_last_twap()
            .await
    }

    pub async fn treasury_allocation_window(&self) -> Result<AllocationWindow, Error> {
        let snapshot = self.snapshot().await;
        PriceOracleClient::new(&snapshot.registry, &self.config)
            .next_allocation_window()
            .await
    }

    pub async fn buy_bonds(&self, amount: Amount) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        treasury::buy_bonds(&snapshot.registry, &self.planner, amount).await
    }

    pub async fn redeem_bonds(&self, amount: Amount) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        treasury::redeem_bonds(&snapshot.registry, &self.planner, amount).await
    }

    // ---- tokens ----

    /// Balance of `symbol` held by the unlocked account
    pub async fn token_balance(&self, symbol: &str) -> Result<Amount, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        Ok(snapshot.registry.token(symbol)?.balance_of(account).await?)
    }

    pub async fn allowance(&self, symbol: &str, spender: Address) -> Result<Amount, Error> {
        let snapshot = self.snapshot().await;
        let account = Self::unlocked_account(&snapshot)?;
        Ok(snapshot
            .registry
            .token(symbol)?
            .allowance(account, spender)
            .await?)
    }

    /// Approve `spender` for `amount` base units of `symbol`
    pub async fn approve(
        &self,
        symbol: &str,
        spender: Address,
        amount: U256,
    ) -> Result<SubmittedTx, Error> {
        let snapshot = self.snapshot().await;
        snapshot
            .registry
            .token(symbol)?
            .approve(&self.planner, spender, amount)
            .await
    }
}
