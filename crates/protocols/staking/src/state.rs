//! Staking State Types

use alloy::primitives::Address;
use fbcash_core::{Amount, PoolDescriptor};
use serde::Serialize;

/// A pool as listed to the user
#[derive(Debug, Clone, Serialize)]
pub struct Bank {
    pub descriptor: PoolDescriptor,
    pub address: Address,
}

/// One account's position in one pool
#[derive(Debug, Clone, Serialize)]
pub struct PoolPosition {
    /// Contract name of the pool
    pub pool: String,
    pub earned: Amount,
    pub staked: Amount,
    // Only set for accelerator pools
    pub accelerator_earned: Option<Amount>,
    pub accelerator_staked: Option<Amount>,
}
