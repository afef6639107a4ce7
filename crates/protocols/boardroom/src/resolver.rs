//! Boardroom version resolution
//!
//! Runs once per unlocked account. Older generations are checked first
//! and the first one holding a stake wins, so a stake left in V1 takes
//! precedence over one in V2.

use alloy::primitives::{Address, U256};
use evm_node_client::bindings::{IBoardroom, IBoardroomV1};
use evm_node_client::ContractRegistry;
use fbcash_core::{Amount, BoardroomVersion, Error, ProtocolError, PROTOCOL_DECIMALS};
use serde::Serialize;

/// Resolution progress for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionState {
    Unresolved,
    Resolved(BoardroomVersion),
}

impl ResolutionState {
    /// The resolved version; boardroom operations are invalid before this
    pub fn version(&self) -> Result<BoardroomVersion, ProtocolError> {
        match self {
            Self::Unresolved => Err(ProtocolError::BoardroomUnresolved),
            Self::Resolved(version) => Ok(*version),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Find the generation holding `account`'s stake
pub async fn resolve_version(
    registry: &ContractRegistry,
    account: Address,
) -> Result<BoardroomVersion, Error> {
    let v1 = registry.contract(BoardroomVersion::V1.contract_name())?;
    let shares = v1.view(&IBoardroomV1::getShareOfCall { account }).await?.shares;
    if shares > U256::ZERO {
        log_resolution(BoardroomVersion::V1, shares);
        return Ok(BoardroomVersion::V1);
    }

    let v2 = registry.contract(BoardroomVersion::V2.contract_name())?;
    let balance = v2.view(&IBoardroom::balanceOfCall { account }).await?.balance;
    if balance > U256::ZERO {
        log_resolution(BoardroomVersion::V2, balance);
        return Ok(BoardroomVersion::V2);
    }

    Ok(BoardroomVersion::Latest)
}

/// As [`resolve_version`], settling on the latest generation when the
/// older contracts cannot be queried.
pub async fn resolve_version_or_latest(
    registry: &ContractRegistry,
    account: Address,
) -> BoardroomVersion {
    match resolve_version(registry, account).await {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!("Failed to fetch boardroom version of {}: {}", account, e);
            BoardroomVersion::Latest
        }
    }
}

fn log_resolution(version: BoardroomVersion, staked: U256) {
    tracing::info!(
        "The user is using boardroom {} (staked {} FBS)",
        version,
        Amount::new(staked, PROTOCOL_DECIMALS).to_display(3)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use evm_node_client::mock::MockTransport;
    use std::sync::Arc;

    fn with_balances(v1: u64, v2: u64) -> Arc<MockTransport> {
        let mock = MockTransport::new();
        mock.on_call_u256::<IBoardroomV1::getShareOfCall>(BOARDROOM1, U256::from(v1));
        mock.on_call_u256::<IBoardroom::balanceOfCall>(BOARDROOM2, U256::from(v2));
        mock
    }

    async fn resolve(v1: u64, v2: u64) -> BoardroomVersion {
        let mock = with_balances(v1, v2);
        resolve_version(&registry(&mock, true), ALICE).await.unwrap()
    }

    #[tokio::test]
    async fn test_resolution_table() {
        assert_eq!(resolve(5, 0).await, BoardroomVersion::V1);
        assert_eq!(resolve(0, 7).await, BoardroomVersion::V2);
        assert_eq!(resolve(0, 0).await, BoardroomVersion::Latest);
        assert_eq!(resolve(3, 9).await, BoardroomVersion::V1);
    }

    #[tokio::test]
    async fn test_v1_stake_short_circuits() {
        let mock = with_balances(3, 9);
        resolve_version(&registry(&mock, true), ALICE).await.unwrap();
        assert!(mock.calls().iter().all(|c| c.to != BOARDROOM2));
    }

    #[tokio::test]
    async fn test_failed_query_falls_back_to_latest() {
        let mock = MockTransport::new();
        mock.on_call_u256::<IBoardroomV1::getShareOfCall>(BOARDROOM1, U256::ZERO);
        let registry = registry(&mock, true);

        assert!(resolve_version(&registry, ALICE).await.is_err());
        assert_eq!(
            resolve_version_or_latest(&registry, ALICE).await,
            BoardroomVersion::Latest
        );
    }

    #[test]
    fn test_unresolved_state_rejects() {
        assert!(matches!(
            ResolutionState::Unresolved.version(),
            Err(ProtocolError::BoardroomUnresolved)
        ));
        assert_eq!(
            ResolutionState::Resolved(BoardroomVersion::V2).version().unwrap(),
            BoardroomVersion::V2
        );
    }
}
