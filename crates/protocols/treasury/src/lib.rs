//! Treasury Protocol Implementation
//!
//! Prices and bonds for the FBCash seigniorage system.
//!
//! # Protocol Overview
//!
//! - FBC (Cash): the stablecoin, pegged to 1 USDT
//! - FBB (Bond): sold below peg, redeemable for Cash above peg
//! - FBS (Share): earns seigniorage through the boardroom
//!
//! # Features
//!
//! - Two independent price sources: the liquidity-pair spot price and the
//!   oracle TWAP estimate, never merged
//! - Bond pricing on the quadratic discount curve
//! - Epoch (allocation window) timing
//! - Bond purchase and redemption through the gas planner
//!
//! # Example
//!
//! ```ignore
//! use treasury::PriceOracleClient;
//!
//! let oracle = PriceOracleClient::new(&registry, &config);
//! let quote = oracle.spot_price("FBC").await;
//! println!("FBC: {}", quote.display());
//! ```

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod tx_builder;

pub use calculator::*;
pub use constants::*;
pub use fetch::PriceOracleClient;
pub use tx_builder::{buy_bonds, redeem_bonds};
