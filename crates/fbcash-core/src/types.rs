//! Core type definitions for the FBCash client

use std::fmt;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BankDefinition, Error, ProtocolError};

/// Generation of the boardroom contract holding an account's stake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardroomVersion {
    V1,
    V2,
    Latest,
}

impl BoardroomVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::Latest => "latest",
        }
    }

    /// Name of the deployment entry for this generation
    pub fn contract_name(&self) -> &'static str {
        match self {
            Self::V1 => "Boardroom1",
            Self::V2 => "Boardroom2",
            Self::Latest => "Boardroom3",
        }
    }

    pub fn is_legacy(&self) -> bool {
        !matches!(self, Self::Latest)
    }
}

impl fmt::Display for BoardroomVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A staking pool as the orchestrator sees it
///
/// `accelerator_token` is present exactly when the pool is an accelerator
/// pool; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    pub name: String,
    pub contract: String,
    pub deposit_token: String,
    pub earn_token: String,
    pub sort: u32,
    pub finished: bool,
    accelerator_token: Option<String>,
}

impl PoolDescriptor {
    pub fn standard(
        name: impl Into<String>,
        contract: impl Into<String>,
        deposit_token: impl Into<String>,
        earn_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            contract: contract.into(),
            deposit_token: deposit_token.into(),
            earn_token: earn_token.into(),
            sort: 0,
            finished: false,
            accelerator_token: None,
        }
    }

    pub fn accelerator(
        name: impl Into<String>,
        contract: impl Into<String>,
        deposit_token: impl Into<String>,
        earn_token: impl Into<String>,
        accelerator_token: impl Into<String>,
    ) -> Self {
        Self {
            accelerator_token: Some(accelerator_token.into()),
            ..Self::standard(name, contract, deposit_token, earn_token)
        }
    }

    /// Build from a bank table row.
    ///
    /// The table always names an accelerator token; it only counts when the
    /// row is flagged as an accelerator pool.
    pub fn from_definition(def: &BankDefinition) -> Result<Self, Error> {
        let accelerator_token = match (def.accelerator, &def.accelerator_token_name) {
            (true, Some(symbol)) => Some(symbol.clone()),
            (true, None) => {
                return Err(Error::Config(format!(
                    "accelerator pool {} has no accelerator token",
                    def.contract
                )))
            }
            (false, _) => None,
        };

        Ok(Self {
            name: def.name.clone(),
            contract: def.contract.clone(),
            deposit_token: def.deposit_token_name.clone(),
            earn_token: def.earn_token_name.clone(),
            sort: def.sort,
            finished: def.finished,
            accelerator_token,
        })
    }

    pub fn with_sort(mut self, sort: u32) -> Self {
        self.sort = sort;
        self
    }

    /// Flag a retired pool
    pub fn mark_finished(mut self) -> Self {
        self.finished = true;
        self
    }

    pub fn is_accelerator(&self) -> bool {
        self.accelerator_token.is_some()
    }

    pub fn accelerator_token(&self) -> Option<&str> {
        self.accelerator_token.as_deref()
    }
}

/// Where a price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Mid-price of the token/reference liquidity pair
    Spot,
    /// Oracle `expectedPrice` estimate
    Twap,
    /// Treasury's last recorded oracle price
    Treasury,
}

/// A price in reference-asset units, or the reason there is none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: String,
    pub source: PriceSource,
    pub price: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

impl PriceQuote {
    pub fn available(asset: impl Into<String>, source: PriceSource, price: Amount) -> Self {
        Self {
            asset: asset.into(),
            source,
            price: Some(price),
            unavailable_reason: None,
        }
    }

    pub fn unavailable(
        asset: impl Into<String>,
        source: PriceSource,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            asset: asset.into(),
            source,
            price: None,
            unavailable_reason: Some(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.price.is_some()
    }

    /// The price, or why there is none
    pub fn require(&self) -> Result<Amount, ProtocolError> {
        self.price.ok_or_else(|| ProtocolError::PriceUnavailable {
            asset: self.asset.clone(),
            reason: self
                .unavailable_reason
                .clone()
                .unwrap_or_else(|| format!("no {:?} price", self.source)),
        })
    }

    /// Three-decimal display string, or "-" when unavailable
    pub fn display(&self) -> String {
        self.price
            .map(|p| p.to_display(3))
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Price and supply summary for one protocol token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStat {
    pub price: PriceQuote,
    pub total_supply: String,
}

/// Bounds of the current seigniorage epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationWindow {
    pub previous_allocation: DateTime<Utc>,
    pub next_allocation: DateTime<Utc>,
}

/// Account address alias used across the workspace
pub type Account = Address;

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(accelerator: bool, token: Option<&str>) -> BankDefinition {
        BankDefinition {
            name: "FBC_USDT_LP Pool(FBG)".into(),
            contract: "FBC_USDT_AcceleratorSharePool".into(),
            deposit_token_name: "FBC_USDT_LP".into(),
            earn_token_name: "FBS".into(),
            sort: 7,
            finished: false,
            accelerator,
            accelerator_token_name: token.map(String::from),
        }
    }

    #[test]
    fn test_pool_descriptor_accelerator_invariant() {
        let pool = PoolDescriptor::from_definition(&definition(true, Some("FBG"))).unwrap();
        assert!(pool.is_accelerator());
        assert_eq!(pool.accelerator_token(), Some("FBG"));

        let plain = PoolDescriptor::from_definition(&definition(false, Some("FBG"))).unwrap();
        assert!(!plain.is_accelerator());
        assert_eq!(plain.accelerator_token(), None);

        assert!(PoolDescriptor::from_definition(&definition(true, None)).is_err());
    }

    #[test]
    fn test_boardroom_version_names() {
        assert_eq!(BoardroomVersion::V1.contract_name(), "Boardroom1");
        assert_eq!(BoardroomVersion::Latest.as_str(), "latest");
        assert!(BoardroomVersion::V2.is_legacy());
        assert!(!BoardroomVersion::Latest.is_legacy());
    }

    #[test]
    fn test_unavailable_quote_display() {
        let quote = PriceQuote::unavailable("FBS", PriceSource::Spot, "no pair");
        assert!(!quote.is_available());
        assert_eq!(quote.display(), "-");
    }

    #[test]
    fn test_require_price() {
        let price = Amount::parse("1.05", 18).unwrap();
        let quote = PriceQuote::available("FBC", PriceSource::Spot, price);
        assert_eq!(quote.require().unwrap(), price);

        let err = PriceQuote::unavailable("FBS", PriceSource::Twap, "oracle paused")
            .require()
            .unwrap_err();
        assert_eq!(err.error_code(), "price_unavailable");
        assert_eq!(err.to_string(), "Price unavailable for FBS: oracle paused");
    }
}
