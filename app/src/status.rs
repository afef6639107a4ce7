//! One-shot status report

use alloy::primitives::Address;
use fbcash_core::{AllocationWindow, Amount, BoardroomVersion, Error, PriceQuote, TokenStat};
use serde::Serialize;
use staking::{Bank, PoolPosition};

use crate::facade::DomainFacade;

const PROTOCOL_TOKENS: [&str; 3] = ["FBC", "FBS", "FBB"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub spot_prices: Vec<PriceQuote>,
    pub twap_prices: Vec<PriceQuote>,
    /// One line per price that could not be determined
    pub unavailable: Vec<String>,
    pub bond: Option<TokenStat>,
    pub share: Option<TokenStat>,
    pub allocation: Option<AllocationWindow>,
    pub banks: Vec<Bank>,
    pub account: Option<Address>,
    pub boardroom: Option<BoardroomStatus>,
    pub positions: Vec<PoolPosition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardroomStatus {
    pub version: BoardroomVersion,
    pub staked: Amount,
    pub earned: Amount,
}

/// Gather everything the facade can tell about the current session.
///
/// Treasury reads that fail are logged and left out; listing and
/// position failures abort the report.
pub async fn collect(facade: &DomainFacade) -> Result<StatusReport, Error> {
    let mut spot_prices = Vec::with_capacity(PROTOCOL_TOKENS.len());
    let mut twap_prices = Vec::with_capacity(PROTOCOL_TOKENS.len());
    for symbol in PROTOCOL_TOKENS {
        let (spot, twap) = tokio::join!(
            facade.spot_price(symbol),
            facade.twap_estimated_price(symbol)
        );
        spot_prices.push(spot);
        twap_prices.push(twap);
    }

    let unavailable = spot_prices
        .iter()
        .chain(&twap_prices)
        .filter_map(|quote| quote.require().err())
        .map(|e| e.to_string())
        .collect();

    let (bond, share, allocation) = tokio::join!(
        facade.bond_stat(),
        facade.share_stat(),
        facade.treasury_allocation_window()
    );

    let account = facade.account().await;
    let (boardroom, positions) = match account {
        Some(_) => (boardroom_status(facade).await, facade.pool_positions().await?),
        None => (None, Vec::new()),
    };

    Ok(StatusReport {
        spot_prices,
        twap_prices,
        unavailable,
        bond: logged("bond stat", bond),
        share: logged("share stat", share),
        allocation: logged("allocation window", allocation),
        banks: facade.banks().await?,
        account,
        boardroom,
        positions,
    })
}

async fn boardroom_status(facade: &DomainFacade) -> Option<BoardroomStatus> {
    let version = facade.boardroom_resolution().await.version().ok()?;
    let (staked, earned) = tokio::join!(
        facade.staked_shares_on_boardroom(),
        facade.earnings_on_boardroom()
    );
    Some(BoardroomStatus {
        version,
        staked: logged("boardroom stake", staked)?,
        earned: logged("boardroom earnings", earned)?,
    })
}

fn logged<T>(what: &str, result: Result<T, Error>) -> Option<T> {
    result
        .map_err(|e| tracing::warn!("Failed to fetch {}: {}", what, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evm_node_client::mock::MockTransport;
    use fbcash_core::ClientConfig;

    #[tokio::test]
    async fn test_locked_report_degrades() {
        let facade = DomainFacade::new(ClientConfig::default(), MockTransport::new()).unwrap();
        let report = collect(&facade).await.unwrap();

        assert_eq!(report.spot_prices.len(), 3);
        assert!(report.spot_prices.iter().all(|q| !q.is_available()));
        assert!(report.twap_prices.iter().all(|q| !q.is_available()));
        assert_eq!(report.unavailable.len(), 6);
        assert!(report.unavailable[0].starts_with("Price unavailable for FBC"));
        assert!(report.bond.is_none());
        assert!(report.allocation.is_none());
        assert!(report.account.is_none());
        assert!(report.banks.is_empty());
    }
}
