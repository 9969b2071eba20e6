pub mod config;
pub mod errors;
pub mod traits;
pub mod types;
pub mod utils;

pub use config::{ClientConfig, ContractsConfig, NetworkConfig, SessionConfig, TimestampUnit};
pub use errors::{Error, Result};
pub use traits::{ViewClient, WalletSession};
pub use types::*;
