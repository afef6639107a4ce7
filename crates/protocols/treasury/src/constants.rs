//! Treasury Protocol Constants
//!
//! Deployment names and token symbols the treasury operations refer to.

/// Deployment descriptor names
pub mod contracts {
    pub const TREASURY: &str = "Treasury";

    /// Oracle answering `expectedPrice` (1-day TWAP)
    pub const SEIGNIORAGE_ORACLE: &str = "SeigniorageOracle";
}

/// Token symbols
pub mod tokens {
    pub const CASH: &str = "FBC";
    pub const SHARE: &str = "FBS";
    pub const BOND: &str = "FBB";
}
