use serde::{Deserialize, Serialize};

/// Endpoints of the NEAR network the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: String,
    pub node_url: String,
    pub wallet_url: String,
}

impl NetworkConfig {
    pub fn testnet() -> Self {
        Self::for_network("testnet")
    }

    /// Builds the public endpoints for a named network. Unknown ids are
    /// treated as a local sandbox.
    pub fn for_network(network_id: &str) -> Self {
        match network_id {
            "mainnet" | "testnet" => Self {
                network_id: network_id.to_string(),
                node_url: format!("https://rpc.{}.near.org", network_id),
                wallet_url: format!("https://wallet.{}.near.org", network_id),
            },
            other => Self {
                network_id: other.to_string(),
                node_url: "http://localhost:3030".to_string(),
                wallet_url: "http://localhost:4000/wallet".to_string(),
            },
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_network() {
        let mainnet = NetworkConfig::for_network("mainnet");
        assert_eq!(mainnet.node_url, "https://rpc.mainnet.near.org");
        assert_eq!(mainnet.wallet_url, "https://wallet.mainnet.near.org");

        let sandbox = NetworkConfig::for_network("sandbox");
        assert_eq!(sandbox.network_id, "sandbox");
        assert_eq!(sandbox.node_url, "http://localhost:3030");
        assert_eq!(NetworkConfig::default(), NetworkConfig::testnet());
    }
}
