//! Fixed-point token amounts
//!
//! Every amount crossing the client boundary is a base-unit `U256` paired
//! with the decimal count of its token. Conversion to and from human
//! decimal strings is exact; no floating point is involved.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Largest decimal count whose scale factor fits in 256 bits
pub const MAX_DECIMALS: u8 = 77;

/// Decimal count used by the protocol tokens and oracle prices
pub const PROTOCOL_DECIMALS: u8 = 18;

/// `10^decimals` as a 256-bit integer
pub fn pow10(decimals: u8) -> U256 {
    debug_assert!(decimals <= MAX_DECIMALS);
    U256::from(10u8).pow(U256::from(decimals))
}

/// A base-unit integer amount with its token's decimal count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    raw: U256,
    decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    /// Whole token units, e.g. `Amount::whole(3, 18)` is 3 tokens
    pub fn whole(units: u64, decimals: u8) -> Self {
        Self::new(U256::from(units) * pow10(decimals), decimals)
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Parse a human decimal string ("12.5") into base units.
    ///
    /// Rejects more fractional digits than the token supports instead of
    /// silently truncating them.
    pub fn parse(input: &str, decimals: u8) -> Result<Self, ProtocolError> {
        if decimals > MAX_DECIMALS {
            return Err(invalid(format!("unsupported decimal count {}", decimals)));
        }

        let input = input.trim();
        let (whole, frac) = input.split_once('.').unwrap_or((input, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid(format!("'{}' is not a number", input)));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid(format!("'{}' is not a number", input)));
        }
        if frac.len() > decimals as usize {
            return Err(invalid(format!(
                "'{}' has more than {} decimal places",
                input, decimals
            )));
        }

        let whole_raw = parse_digits(whole)?;
        let frac_padded = format!("{:0<width$}", frac, width = decimals as usize);
        let frac_raw = parse_digits(&frac_padded)?;

        let raw = whole_raw
            .checked_mul(pow10(decimals))
            .and_then(|v| v.checked_add(frac_raw))
            .ok_or_else(|| invalid(format!("'{}' exceeds 256 bits", input)))?;

        Ok(Self::new(raw, decimals))
    }

    /// Exact decimal rendering with trailing zeros removed
    pub fn to_decimal_string(&self) -> String {
        let (whole, frac) = self.split();
        if frac.is_empty() {
            return whole;
        }
        let trimmed = frac.trim_end_matches('0');
        if trimmed.is_empty() {
            whole
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }

    /// Rendering truncated to `fraction_digits` places, for display only
    pub fn to_display(&self, fraction_digits: usize) -> String {
        let (whole, frac) = self.split();
        let digits = fraction_digits.min(frac.len());
        if digits == 0 {
            whole
        } else {
            format!("{}.{}", whole, &frac[..digits])
        }
    }

    fn split(&self) -> (String, String) {
        if self.decimals == 0 {
            return (self.raw.to_string(), String::new());
        }
        let unit = pow10(self.decimals);
        let whole = self.raw / unit;
        let frac = self.raw % unit;
        (
            whole.to_string(),
            format!("{:0>width$}", frac.to_string(), width = self.decimals as usize),
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

fn parse_digits(digits: &str) -> Result<U256, ProtocolError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| invalid(format!("'{}' is out of range: {}", digits, e)))
}

fn invalid(message: String) -> ProtocolError {
    ProtocolError::InvalidAmount { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exact() {
        let amount = Amount::new(U256::from(1_450_000_000_000_000_000u128), 18);
        assert_eq!(amount.to_decimal_string(), "1.45");
        assert_eq!(amount.to_display(1), "1.4");

        let usdt = Amount::new(U256::from(2_500_001u64), 6);
        assert_eq!(usdt.to_decimal_string(), "2.500001");
        assert_eq!(Amount::whole(7, 18).to_decimal_string(), "7");
        assert_eq!(Amount::zero(6).to_decimal_string(), "0");
    }

    #[test]
    fn test_parse_and_format_round_trip_near_ceiling() {
        for decimals in [6u8, 18] {
            for raw in [
                U256::ZERO,
                U256::from(1u8),
                U256::from(123_456_789u64),
                U256::MAX,
                U256::MAX - U256::from(1u8),
            ] {
                let amount = Amount::new(raw, decimals);
                let parsed = Amount::parse(&amount.to_decimal_string(), decimals).unwrap();
                assert_eq!(parsed.raw(), raw, "decimals {}", decimals);
            }
        }
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(
            Amount::parse("1.5", 6).unwrap().raw(),
            U256::from(1_500_000u64)
        );
        assert_eq!(Amount::parse(".25", 2).unwrap().raw(), U256::from(25u8));
        assert_eq!(Amount::parse("42", 0).unwrap().raw(), U256::from(42u8));
        assert_eq!(Amount::parse(" 3. ", 2).unwrap().raw(), U256::from(300u16));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Amount::parse("", 18).is_err());
        assert!(Amount::parse(".", 18).is_err());
        assert!(Amount::parse("-1", 18).is_err());
        assert!(Amount::parse("1e18", 18).is_err());
        assert!(Amount::parse("0.1234567", 6).is_err());

        let too_big = format!("{}0", U256::MAX);
        match Amount::parse(&too_big, 0).unwrap_err() {
            ProtocolError::InvalidAmount { .. } => {}
            other => panic!("Expected InvalidAmount, got: {:?}", other),
        }
    }
}
