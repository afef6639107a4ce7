//! Reward Pool Staking
//!
//! Pools ("banks") take a deposit token and pay out Cash or Share.
//! Accelerator pools additionally take FBG and pay an accelerator reward.
//!
//! Reads degrade to zero when a pool call reverts, so a single broken
//! pool never hides the rest. Mutations go through the gas planner and
//! surface every failure.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{StakingOrchestrator, NATIVE_TOKEN};
pub use state::{Bank, PoolPosition};
