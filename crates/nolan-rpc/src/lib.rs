//! NEAR JSON-RPC transport for contract view calls

pub mod client;
pub mod network;
pub mod types;

pub use client::NearRpcClient;
pub use network::NearNetwork;
