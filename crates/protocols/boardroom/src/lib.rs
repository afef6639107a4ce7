//! Boardroom Protocol Implementation
//!
//! Share stakers earn seigniorage in the boardroom. Three incompatible
//! generations of the contract are deployed; an account's stake lives in
//! exactly one of them.
//!
//! - `resolver`: finds the generation holding the account's stake
//! - `versions`: one `Boardroom` implementation per generation
//! - `dispatch`: the uniform entry point, refusing changes to legacy
//!   generations other than leaving them

pub mod dispatch;
pub mod resolver;
pub mod versions;

pub use dispatch::BoardroomDispatcher;
pub use resolver::{resolve_version, resolve_version_or_latest, ResolutionState};
pub use versions::{boardroom_for, Boardroom, LegacyBoardroom, StandardBoardroom};

#[cfg(test)]
mod testing;
