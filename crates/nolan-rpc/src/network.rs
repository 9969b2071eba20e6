/// NEAR network a client is attached to, derived from the configured network id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearNetwork {
    Mainnet,
    Testnet,
    /// Local sandbox node
    Localnet,
    /// Any other network id, reached through an explicit `node_url`
    Custom,
}

impl NearNetwork {
    pub fn from_id(network_id: &str) -> Self {
        match network_id {
            "mainnet" => NearNetwork::Mainnet,
            "testnet" => NearNetwork::Testnet,
            "localnet" | "sandbox" => NearNetwork::Localnet,
            _ => NearNetwork::Custom,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NearNetwork::Mainnet => "mainnet",
            NearNetwork::Testnet => "testnet",
            NearNetwork::Localnet => "localnet",
            NearNetwork::Custom => "custom",
        }
    }
}
