//! Price and treasury state fetching
//!
//! Spot and TWAP quotes degrade to an explicit "unavailable" quote on any
//! failure; they never return an error. Treasury reads that callers act on
//! (epoch timing, last oracle prices) propagate their errors.

use alloy::primitives::U256;
use evm_node_client::bindings::{ISeigniorageOracle, ITreasury, IUniswapV2Pair};
use evm_node_client::{ContractRegistry, TokenHandle};
use fbcash_core::{
    pow10, AllocationWindow, Amount, ClientConfig, Error, PriceQuote, PriceSource, TokenStat,
    UniswapConfig, PROTOCOL_DECIMALS,
};

use crate::calculator::{allocation_window, bond_price, mid_price, pair_address, sort_tokens};
use crate::constants::{contracts, tokens};

/// Read-side access to both price sources and the treasury
pub struct PriceOracleClient<'a> {
    registry: &'a ContractRegistry,
    uniswap: &'a UniswapConfig,
    reference_symbol: &'a str,
}

impl<'a> PriceOracleClient<'a> {
    pub fn new(registry: &'a ContractRegistry, config: &'a ClientConfig) -> Self {
        Self {
            registry,
            uniswap: &config.uniswap,
            reference_symbol: &config.reference_token,
        }
    }

    /// Mid-price of `symbol` in the reference asset from its direct pair
    pub async fn spot_price(&self, symbol: &str) -> PriceQuote {
        match self.try_spot_price(symbol).await {
            Ok(price) => PriceQuote::available(symbol, PriceSource::Spot, price),
            Err(reason) => {
                tracing::warn!("Failed to fetch spot price of {}: {}", symbol, reason);
                PriceQuote::unavailable(symbol, PriceSource::Spot, reason)
            }
        }
    }

    async fn try_spot_price(&self, symbol: &str) -> Result<Amount, String> {
        let token = self.registry.token(symbol).map_err(|e| e.to_string())?;
        let reference = self
            .registry
            .token(self.reference_symbol)
            .map_err(|e| e.to_string())?;

        let pair_addr = pair_address(
            self.uniswap.factory,
            self.uniswap.init_code_hash,
            token.address(),
            reference.address(),
        );
        let pair = self
            .registry
            .handle_at(format!("{}_{}_pair", symbol, self.reference_symbol), pair_addr);

        let reserves = pair
            .view(&IUniswapV2Pair::getReservesCall {})
            .await
            .map_err(|e| format!("no usable pair at {}: {}", pair_addr, e))?;

        let (token0, _) = sort_tokens(token.address(), reference.address());
        let (reserve_token, reserve_reference) = if token0 == token.address() {
            (U256::from(reserves.reserve0), U256::from(reserves.reserve1))
        } else {
            (U256::from(reserves.reserve1), U256::from(reserves.reserve0))
        };

        mid_price(
            reserve_token,
            reserve_reference,
            token.decimals(),
            reference.decimals(),
        )
        .ok_or_else(|| format!("pair {} has no reserves", pair_addr))
    }

    /// Oracle estimate for one whole `symbol` token
    pub async fn twap_estimated_price(&self, symbol: &str) -> PriceQuote {
        match self.try_twap_price(symbol).await {
            Ok(price) => PriceQuote::available(symbol, PriceSource::Twap, price),
            Err(reason) => {
                tracing::warn!("Failed to fetch TWAP estimate of {}: {}", symbol, reason);
                PriceQuote::unavailable(symbol, PriceSource::Twap, reason)
            }
        }
    }

    async fn try_twap_price(&self, symbol: &str) -> Result<Amount, String> {
        let token = self.registry.token(symbol).map_err(|e| e.to_string())?;
        let oracle = self
            .registry
            .contract(contracts::SEIGNIORAGE_ORACLE)
            .map_err(|e| e.to_string())?;

        let ret = oracle
            .view(&ISeigniorageOracle::expectedPriceCall {
                token: token.address(),
                amountIn: pow10(token.decimals()),
            })
            .await
            .map_err(|e| e.to_string())?;

        Ok(Amount::new(ret.amountOut, PROTOCOL_DECIMALS))
    }

    /// Cash price recorded by the treasury at the last epoch
    pub async fn cash_price_in_last_twap(&self) -> Result<U256, Error> {
        let treasury = self.registry.contract(contracts::TREASURY)?;
        let ret = treasury
            .view(&ITreasury::getSeigniorageOraclePriceCall {})
            .await?;
        Ok(ret.price)
    }

    /// Price the treasury uses for bond sales
    pub async fn bond_oracle_price_in_last_twap(&self) -> Result<U256, Error> {
        let treasury = self.registry.contract(contracts::TREASURY)?;
        let ret = treasury.view(&ITreasury::getBondOraclePriceCall {}).await?;
        Ok(ret.price)
    }

    pub async fn next_allocation_window(&self) -> Result<AllocationWindow, Error> {
        let treasury = self.registry.contract(contracts::TREASURY)?;
        let (point, period) = tokio::join!(
            treasury.view(&ITreasury::nextEpochPointCall {}),
            treasury.view(&ITreasury::getPeriodCall {}),
        );
        Ok(allocation_window(point?.point, period?.period)?)
    }

    /// Cash price from the pair; may differ from the treasury's TWAP
    pub async fn cash_stat_from_spot(&self) -> Result<TokenStat, Error> {
        let cash = self.registry.token(tokens::CASH)?;
        stat_from_spot(self, cash).await
    }

    /// Cash price from the 1-day TWAP oracle
    pub async fn cash_stat_in_estimated_twap(&self) -> Result<TokenStat, Error> {
        let cash = self.registry.token(tokens::CASH)?;
        let (price, supply) = tokio::join!(
            self.twap_estimated_price(tokens::CASH),
            cash.displayed_total_supply()
        );
        Ok(TokenStat {
            price,
            total_supply: supply?,
        })
    }

    /// Bond price: the bond-oracle price on the discount curve
    pub async fn bond_stat(&self) -> Result<TokenStat, Error> {
        let bond = self.registry.token(tokens::BOND)?;
        let (oracle_price, supply) = tokio::join!(
            self.bond_oracle_price_in_last_twap(),
            bond.displayed_total_supply()
        );

        let price = match oracle_price.and_then(|p| bond_price(p).map_err(Error::from)) {
            Ok(p) => PriceQuote::available(
                tokens::BOND,
                PriceSource::Treasury,
                Amount::new(p, PROTOCOL_DECIMALS),
            ),
            Err(e) => {
                tracing::warn!("Failed to derive bond price: {}", e);
                PriceQuote::unavailable(tokens::BOND, PriceSource::Treasury, e.to_string())
            }
        };

        Ok(TokenStat {
            price,
            total_supply: supply?,
        })
    }

    pub async fn share_stat(&self) -> Result<TokenStat, Error> {
        let share = self.registry.token(tokens::SHARE)?;
        stat_from_spot(self, share).await
    }
}

async fn stat_from_spot(
    oracle: &PriceOracleClient<'_>,
    token: &TokenHandle,
) -> Result<TokenStat, Error> {
    let (price, supply) = tokio::join!(
        oracle.spot_price(token.symbol()),
        token.displayed_total_supply()
    );
    Ok(TokenStat {
        price,
        total_supply: supply?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Address};
    use evm_node_client::bindings::IERC20;
    use evm_node_client::mock::MockTransport;
    use fbcash_core::{Deployment, ExternalToken};

    const TREASURY: Address = address!("00000000000000000000000000000000000000a1");
    const ORACLE: Address = address!("00000000000000000000000000000000000000a2");
    const CASH: Address = address!("00000000000000000000000000000000000000c1");
    const SHARE: Address = address!("00000000000000000000000000000000000000c2");
    const BOND: Address = address!("00000000000000000000000000000000000000c3");
    const USDT: Address = address!("00000000000000000000000000000000000000d1");

    fn config() -> ClientConfig {
        let mut config = ClientConfig::default();
        for (name, address) in [
            ("Treasury", TREASURY),
            ("SeigniorageOracle", ORACLE),
            ("Cash", CASH),
            ("Share", SHARE),
            ("Bond", BOND),
        ] {
            config.deployments.insert(
                name.to_string(),
                Deployment {
                    address,
                    abi: serde_json::Value::Null,
                },
            );
        }
        config
            .external_tokens
            .insert("USDT".to_string(), ExternalToken(USDT, 6));
        config
    }

    fn e18(units: u64) -> U256 {
        U256::from(units) * pow10(18)
    }

    #[tokio::test]
    async fn test_spot_price_from_pair_reserves() {
        let config = config();
        let mock = MockTransport::new();
        let pair = pair_address(
            config.uniswap.factory,
            config.uniswap.init_code_hash,
            CASH,
            USDT,
        );
        // CASH < USDT, so reserve0 is the cash side
        mock.on_call_words::<IUniswapV2Pair::getReservesCall>(
            pair,
            &[e18(2_000), U256::from(1_000_000_000u64), U256::ZERO],
        );
        let registry = ContractRegistry::from_config(&config, mock);
        let oracle = PriceOracleClient::new(&registry, &config);

        let quote = oracle.spot_price("FBC").await;
        assert_eq!(quote.source, PriceSource::Spot);
        assert_eq!(quote.price.unwrap().to_decimal_string(), "0.5");
    }

    #[tokio::test]
    async fn test_spot_price_without_pair_is_unavailable() {
        let config = config();
        let registry = ContractRegistry::from_config(&config, MockTransport::new());
        let oracle = PriceOracleClient::new(&registry, &config);

        let quote = oracle.spot_price("FBS").await;
        assert!(!quote.is_available());
        assert!(quote.unavailable_reason.is_some());

        let unknown = oracle.spot_price("DOGE").await;
        assert!(!unknown.is_available());
    }

    #[tokio::test]
    async fn test_twap_and_spot_fail_independently() {
        let config = config();
        let mock = MockTransport::new();
        mock.on_call_u256::<ISeigniorageOracle::expectedPriceCall>(
            ORACLE,
            U256::from(980_000_000_000_000_000u128),
        );
        let registry = ContractRegistry::from_config(&config, mock);
        let oracle = PriceOracleClient::new(&registry, &config);

        let twap = oracle.twap_estimated_price("FBC").await;
        let spot = oracle.spot_price("FBC").await;
        assert_eq!(twap.price.unwrap().to_decimal_string(), "0.98");
        assert_eq!(twap.source, PriceSource::Twap);
        assert!(!spot.is_available());
    }

    #[tokio::test]
    async fn test_bond_stat_applies_curve() {
        let config = config();
        let mock = MockTransport::new();
        mock.on_call_u256::<ITreasury::getBondOraclePriceCall>(
            TREASURY,
            U256::from(1_200_000_000_000_000_000u128),
        );
        mock.on_call_u256::<IERC20::totalSupplyCall>(BOND, e18(42));
        let registry = ContractRegistry::from_config(&config, mock);
        let oracle = PriceOracleClient::new(&registry, &config);

        let stat = oracle.bond_stat().await.unwrap();
        assert_eq!(stat.price.price.unwrap().to_decimal_string(), "1.44");
        assert_eq!(stat.total_supply, "42");
    }

    #[tokio::test]
    async fn test_next_allocation_window() {
        let config = config();
        let mock = MockTransport::new();
        mock.on_call_u256::<ITreasury::nextEpochPointCall>(TREASURY, U256::from(1_000_000u64));
        mock.on_call_u256::<ITreasury::getPeriodCall>(TREASURY, U256::from(3_600u64));
        let registry = ContractRegistry::from_config(&config, mock);
        let oracle = PriceOracleClient::new(&registry, &config);

        let window = oracle.next_allocation_window().await.unwrap();
        assert_eq!(window.next_allocation.timestamp(), 1_000_000);
        assert_eq!(window.previous_allocation.timestamp(), 996_400);
    }
}
