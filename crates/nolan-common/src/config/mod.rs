//! Configuration types for the staking client

mod network;

pub use network::NetworkConfig;

use {
    serde::{Deserialize, Serialize},
    std::{fs, path::Path, time::Duration},
};

use crate::errors::{Error, Result};

/// One TGas, in gas units.
pub const TGAS: u64 = 1_000_000_000_000;

/// One yoctoNEAR, the smallest deposit unit.
pub const ONE_YOCTO: u128 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub staking_contract: String,
    pub token_contract: String,
    /// Skips the `decimals()` lookup on the staking contract when set.
    #[serde(default)]
    pub staking_decimals: Option<u32>,
    /// Skips the `ft_metadata()` lookup on the token contract when set.
    #[serde(default)]
    pub token_decimals: Option<u32>,
    #[serde(default = "default_stake_message")]
    pub stake_message: String,
    #[serde(default)]
    pub timestamp_unit: TimestampUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_transfer_gas")]
    pub transfer_gas: u64,
    #[serde(default = "default_withdraw_gas")]
    pub withdraw_gas: u64,
    #[serde(default = "default_storage_gas")]
    pub storage_gas: u64,
    #[serde(default = "default_transfer_deposit")]
    pub transfer_deposit: u128,
    #[serde(default = "default_storage_deposit")]
    pub storage_deposit: u128,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_display_precision")]
    pub display_precision: u32,
}

/// Unit of the `since` field reported by the staking contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Milliseconds,
    Nanoseconds,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            contracts: ContractsConfig::default(),
            session: SessionConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            staking_contract: "dev-1654609907459-16983689322351".to_string(),
            token_contract: "dev-1653846714290-58446128043200".to_string(),
            staking_decimals: None,
            token_decimals: None,
            stake_message: default_stake_message(),
            timestamp_unit: TimestampUnit::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transfer_gas: default_transfer_gas(),
            withdraw_gas: default_withdraw_gas(),
            storage_gas: default_storage_gas(),
            transfer_deposit: default_transfer_deposit(),
            storage_deposit: default_storage_deposit(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            display_precision: default_display_precision(),
        }
    }
}

impl SessionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays values found in the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network_id) = lookup("NEAR_ENV") {
            self.network = NetworkConfig::for_network(&network_id);
        }
        if let Some(node_url) = lookup("NEAR_NODE_URL") {
            self.network.node_url = node_url;
        }
        if let Some(wallet_url) = lookup("NEAR_WALLET_URL") {
            self.network.wallet_url = wallet_url;
        }
        if let Some(contract) = lookup("STAKING_CONTRACT_ID") {
            self.contracts.staking_contract = contract;
        }
        if let Some(contract) = lookup("TOKEN_CONTRACT_ID") {
            self.contracts.token_contract = contract;
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = level;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.contracts.staking_contract.is_empty() {
            return Err(Error::Config("staking_contract must be set".into()));
        }
        if self.contracts.token_contract.is_empty() {
            return Err(Error::Config("token_contract must be set".into()));
        }
        if self.session.transfer_gas == 0 || self.session.withdraw_gas == 0 {
            return Err(Error::Config("gas budgets must be non-zero".into()));
        }
        // ft_transfer_call requires exactly one attached yoctoNEAR
        if self.session.transfer_deposit != ONE_YOCTO {
            return Err(Error::Config(format!(
                "transfer_deposit must be {} yoctoNEAR, got {}",
                ONE_YOCTO, self.session.transfer_deposit
            )));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stake_message() -> String {
    "staking".to_string()
}

fn default_transfer_gas() -> u64 {
    300 * TGAS
}

fn default_withdraw_gas() -> u64 {
    100 * TGAS
}

fn default_storage_gas() -> u64 {
    30 * TGAS
}

fn default_transfer_deposit() -> u128 {
    ONE_YOCTO
}

fn default_storage_deposit() -> u128 {
    // 0.00125 NEAR
    1_250_000_000_000_000_000_000
}

fn default_read_timeout_ms() -> u64 {
    10_000
}

fn default_write_timeout_ms() -> u64 {
    60_000
}

fn default_display_precision() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_target_testnet() {
        let config = ClientConfig::default();
        assert_eq!(config.network.node_url, "https://rpc.testnet.near.org");
        assert_eq!(config.session.transfer_gas, 300_000_000_000_000);
        assert_eq!(config.session.transfer_deposit, 1);
        assert_eq!(config.contracts.stake_message, "staking");
        assert_eq!(config.contracts.timestamp_unit, TimestampUnit::Milliseconds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "contracts": {
                "staking_contract": "stake.testnet",
                "token_contract": "token.testnet",
                "staking_decimals": 18,
                "timestamp_unit": "nanoseconds"
            }
        }"#;
        let config: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.contracts.staking_decimals, Some(18));
        assert_eq!(config.contracts.token_decimals, None);
        assert_eq!(config.contracts.timestamp_unit, TimestampUnit::Nanoseconds);
        assert_eq!(config.session.display_precision, 3);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NEAR_ENV", "mainnet"),
            ("STAKING_CONTRACT_ID", "stake.near"),
            ("RUST_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.network.node_url, "https://rpc.mainnet.near.org");
        assert_eq!(config.contracts.staking_contract, "stake.near");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_wrong_transfer_deposit() {
        let mut config = ClientConfig::default();
        config.session.transfer_deposit = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
