// crates/nolan-rpc/src/client.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use nolan_common::{Error, NetworkConfig, Result, ViewClient};

use crate::network::NearNetwork;
use crate::types::{CallFunctionParams, CallResult, RpcRequest, RpcResponse};

/// NEAR RPC client serving contract view calls
#[derive(Debug, Clone)]
pub struct NearRpcClient {
    /// HTTP client
    client: Client,
    /// RPC URL
    rpc_url: String,
    /// Current network
    network: NearNetwork,
    /// Per-request timeout
    timeout: Duration,
}

impl NearRpcClient {
    /// Create a client for `config.node_url` with a per-request timeout
    pub fn new(config: &NetworkConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let network = NearNetwork::from_id(&config.network_id);

        info!("Initializing NEAR RPC client for {} ({})", config.node_url, network.name());

        Ok(Self {
            client,
            rpc_url: config.node_url.clone(),
            network,
            timeout,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn network(&self) -> NearNetwork {
        self.network
    }

    async fn query(&self, params: CallFunctionParams<'_>) -> Result<RpcResponse<CallResult>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: "nolan",
            method: "query",
            params,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "{} returned HTTP {}",
                self.rpc_url,
                response.status()
            )));
        }

        response
            .json::<RpcResponse<CallResult>>()
            .await
            .map_err(|e| Error::Transport(format!("invalid RPC response: {}", e)))
    }
}

#[async_trait]
impl ViewClient for NearRpcClient {
    async fn view_function(&self, contract_id: &str, method_name: &str, args: Value) -> Result<Value> {
        debug!("view {}.{}({})", contract_id, method_name, args);

        let params = CallFunctionParams {
            request_type: "call_function",
            finality: "final",
            account_id: contract_id,
            method_name,
            args_base64: encode_args(&args)?,
        };

        let response = self.query(params).await?;
        decode_call_response(response).map_err(|e| {
            warn!("view {}.{} failed: {}", contract_id, method_name, e);
            e
        })
    }
}

pub(crate) fn encode_args(args: &Value) -> Result<String> {
    let bytes = match args {
        Value::Null => Vec::new(),
        other => serde_json::to_vec(other)?,
    };
    Ok(base64::encode(bytes))
}

/// Unwraps the envelope of a `call_function` query into the method's JSON return value.
pub(crate) fn decode_call_response(response: RpcResponse<CallResult>) -> Result<Value> {
    if let Some(error) = response.error {
        let message = match error.data {
            Some(Value::String(data)) => format!("{}: {}", error.message, data),
            Some(data) => format!("{}: {}", error.message, data),
            None => error.message,
        };
        return Err(Error::Rpc {
            code: error.code,
            message,
        });
    }

    let result = response
        .result
        .ok_or_else(|| Error::Transport("RPC response has neither result nor error".into()))?;

    if let Some(error) = result.error {
        return Err(Error::Contract(error));
    }

    for log in &result.logs {
        debug!("contract log: {}", log);
    }

    match result.result {
        Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
        _ => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> RpcResponse<CallResult> {
        serde_json::from_value(body).unwrap()
    }

    fn as_bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_encode_args() {
        assert_eq!(
            encode_args(&json!({"staker": "a.testnet"})).unwrap(),
            base64::encode(br#"{"staker":"a.testnet"}"#)
        );
        assert_eq!(encode_args(&Value::Null).unwrap(), "");
    }

    #[test]
    fn test_decode_view_result() {
        let summary = json!({"total_amount": "500", "stakes": []});
        let body = json!({
            "jsonrpc": "2.0",
            "id": "nolan",
            "result": {
                "result": as_bytes(&summary),
                "logs": ["claimable_amount=0"],
                "block_height": 42,
                "block_hash": "abc"
            }
        });

        assert_eq!(decode_call_response(response(body)).unwrap(), summary);
    }

    #[test]
    fn test_decode_null_and_empty() {
        let null_body = json!({"result": {"result": as_bytes(&Value::Null), "logs": []}});
        assert_eq!(decode_call_response(response(null_body)).unwrap(), Value::Null);

        let empty_body = json!({"result": {"result": [], "logs": []}});
        assert_eq!(decode_call_response(response(empty_body)).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_contract_panic() {
        let body = json!({
            "result": {
                "error": "wasm execution failed with error: FunctionCallError(HostError(GuestPanic))",
                "logs": [],
                "block_height": 7
            }
        });

        match decode_call_response(response(body)) {
            Err(Error::Contract(message)) => assert!(message.contains("GuestPanic")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rpc_error() {
        let body = json!({
            "error": {"code": -32000, "message": "Server error", "data": "account does not exist"}
        });

        match decode_call_response(response(body)) {
            Err(Error::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "Server error: account does not exist");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_node_is_transport_error() {
        let mut config = NetworkConfig::for_network("localnet");
        config.node_url = "http://127.0.0.1:1".to_string();
        let client = NearRpcClient::new(&config, Duration::from_secs(2)).unwrap();
        assert_eq!(client.network(), NearNetwork::Localnet);

        let result = tokio_test::block_on(client.view_function("stake.test", "decimals", json!({})));
        assert!(matches!(result, Err(Error::Transport(_)) | Err(Error::Timeout(_))));
    }
}
