//! Typed bindings for the two contracts the service talks to.
//!
//! Reads go through a [`ViewClient`](nolan_common::ViewClient). Change methods
//! are only described here as [`FunctionCall`](nolan_common::FunctionCall)s;
//! submitting them is left to the service so every write passes its guard.

mod staking;
mod token;
pub mod types;

pub use staking::StakingContract;
pub use token::TokenContract;
pub use types::{FungibleTokenMetadata, StorageBalance, NEAR_DECIMALS};
