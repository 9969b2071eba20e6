//! Staking position client for a NEP-141 staking contract.
//! Converts on-chain integer amounts for display, aggregates stake records and
//! issues correctly-scaled stake/withdraw calls.

pub mod amount;
pub mod contracts;
pub mod service;
pub mod snapshot;

pub use amount::FixedPointAmount;
pub use service::{Overview, SessionState, StakingService};
pub use snapshot::{StakeRecord, StakingSnapshot};

use thiserror::Error;

/// Errors that can occur in staking operations
#[derive(Error, Debug)]
pub enum StakingError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Scale mismatch: {left} vs {right}")]
    ScaleMismatch { left: u32, right: u32 },

    #[error("Malformed contract response: {0}")]
    MalformedResponse(String),

    #[error("Session not ready: {0}")]
    NotReady(String),

    #[error("Account {0} has no storage registered on the token contract")]
    StorageNotRegistered(String),

    #[error("Stake index {index} out of bounds ({len} stakes)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Requested {requested} exceeds claimable {claimable}")]
    AmountExceedsClaimable { requested: String, claimable: String },

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Another write is already in flight for this account")]
    WriteInProgress,

    #[error("Write outcome unknown: {0}")]
    Indeterminate(String),
}

impl From<nolan_common::Error> for StakingError {
    fn from(e: nolan_common::Error) -> Self {
        StakingError::UpstreamError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StakingError>;
