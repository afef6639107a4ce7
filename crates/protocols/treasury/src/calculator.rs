//! Treasury Calculator
//!
//! Pure math for prices and epochs. No I/O, no async.
//!
//! # Units
//!
//! - Prices: 18-decimal fixed point, reference-asset (USDT) per token
//! - Reserves: raw base units of each side of the pair
//! - Epoch points: unix seconds

use alloy::primitives::{keccak256, Address, B256, U256};
use chrono::DateTime;
use fbcash_core::{pow10, AllocationWindow, Amount, ProtocolError, PROTOCOL_DECIMALS};

/// Bond price on the quadratic discount curve: `p² / 10^18`.
///
/// Squares before dividing; dividing first would drop the low digits of
/// every price below peg.
pub fn bond_price(cash_price: U256) -> Result<U256, ProtocolError> {
    cash_price
        .checked_mul(cash_price)
        .map(|squared| squared / pow10(PROTOCOL_DECIMALS))
        .ok_or_else(|| ProtocolError::InvalidAmount {
            message: format!("cash price {} is too large to square", cash_price),
        })
}

/// Mid-price of `token` in reference units from pair reserves.
///
/// Returns `None` when either side of the pair is empty.
pub fn mid_price(
    reserve_token: U256,
    reserve_reference: U256,
    token_decimals: u8,
    reference_decimals: u8,
) -> Option<Amount> {
    if reserve_token.is_zero() || reserve_reference.is_zero() {
        return None;
    }

    let numerator = reserve_reference
        .checked_mul(pow10(token_decimals))?
        .checked_mul(pow10(PROTOCOL_DECIMALS))?;
    let denominator = reserve_token.checked_mul(pow10(reference_decimals))?;

    Some(Amount::new(numerator / denominator, PROTOCOL_DECIMALS))
}

/// Uniswap-V2 pair address for two tokens (order-independent)
pub fn pair_address(factory: Address, init_code_hash: B256, a: Address, b: Address) -> Address {
    let (token0, token1) = sort_tokens(a, b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_slice());
    packed[20..].copy_from_slice(token1.as_slice());
    factory.create2(keccak256(packed).0, init_code_hash.0)
}

/// Pair ordering used by the factory
pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Previous and next allocation from the treasury's epoch point and period
pub fn allocation_window(
    next_epoch_point: U256,
    period: U256,
) -> Result<AllocationWindow, ProtocolError> {
    let next_secs = to_seconds(next_epoch_point, "nextEpochPoint")?;
    let period_secs = to_seconds(period, "period")?;
    let prev_secs = next_secs
        .checked_sub(period_secs)
        .ok_or_else(|| ProtocolError::StateUnavailable {
            reason: format!(
                "period {} is longer than epoch point {}",
                period_secs, next_secs
            ),
        })?;

    Ok(AllocationWindow {
        previous_allocation: timestamp(prev_secs)?,
        next_allocation: timestamp(next_secs)?,
    })
}

fn to_seconds(value: U256, what: &str) -> Result<i64, ProtocolError> {
    u64::try_from(value)
        .ok()
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| ProtocolError::StateUnavailable {
            reason: format!("{} {} is not a valid timestamp", what, value),
        })
}

fn timestamp(secs: i64) -> Result<chrono::DateTime<chrono::Utc>, ProtocolError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| ProtocolError::StateUnavailable {
        reason: format!("{} is out of calendar range", secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    fn e18(units: u64) -> U256 {
        U256::from(units) * pow10(18)
    }

    #[test]
    fn test_bond_price_squares_before_dividing() {
        let cash = U256::from(1_200_000_000_000_000_000u128);
        assert_eq!(
            bond_price(cash).unwrap(),
            U256::from(1_440_000_000_000_000_000u128)
        );

        // 0.9 -> 0.81, below peg the bond is cheaper than cash
        let below = U256::from(900_000_000_000_000_000u128);
        assert_eq!(
            bond_price(below).unwrap(),
            U256::from(810_000_000_000_000_000u128)
        );

        // Dividing first would round this to zero
        assert_eq!(bond_price(U256::from(10u64).pow(U256::from(9u8))).unwrap(), U256::from(1u8));
    }

    #[test]
    fn test_bond_price_matches_definition() {
        let top = pow10(36) - U256::from(1u8);
        for p in [U256::ZERO, U256::from(1u8), e18(1), e18(3), top] {
            assert_eq!(bond_price(p).unwrap(), p * p / pow10(18));
        }
        assert!(bond_price(U256::MAX).is_err());
    }

    #[test]
    fn test_mid_price_adjusts_decimals() {
        // 1_000 FBC (18 decimals) against 1_050 USDT (6 decimals)
        let price = mid_price(e18(1_000), U256::from(1_050_000_000u64), 18, 6).unwrap();
        assert_eq!(price.to_decimal_string(), "1.05");

        assert!(mid_price(U256::ZERO, U256::from(5u8), 18, 6).is_none());
        assert!(mid_price(e18(1), U256::ZERO, 18, 6).is_none());
    }

    #[test]
    fn test_pair_address_known_pair() {
        let factory = address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
        let hash = b256!("96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f");
        let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let weth = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

        let expected = address!("B4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc");
        assert_eq!(pair_address(factory, hash, usdc, weth), expected);
        assert_eq!(pair_address(factory, hash, weth, usdc), expected);
    }

    #[test]
    fn test_allocation_window() {
        let window = allocation_window(U256::from(1_607_990_400u64), U256::from(86_400u64)).unwrap();
        assert_eq!(window.next_allocation.timestamp(), 1_607_990_400);
        assert_eq!(window.previous_allocation.timestamp(), 1_607_904_000);

        assert!(allocation_window(U256::from(10u8), U256::from(20u8)).is_err());
        assert!(allocation_window(U256::MAX, U256::from(1u8)).is_err());
    }
}
