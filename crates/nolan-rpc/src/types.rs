//! JSON-RPC envelopes for the NEAR `query` method

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: &'static str,
    pub method: &'static str,
    pub params: P,
}

/// Params of a `query` request with `request_type = call_function`.
#[derive(Debug, Serialize)]
pub struct CallFunctionParams<'a> {
    pub request_type: &'static str,
    pub finality: &'static str,
    pub account_id: &'a str,
    pub method_name: &'a str,
    pub args_base64: String,
}

/// Missing `result` or `error` members deserialize as `None`.
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorDetail {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Result of a `call_function` query.
///
/// A contract panic during a view call is reported inside `result` as an
/// `error` string rather than as an RPC error.
#[derive(Debug, Deserialize)]
pub struct CallResult {
    #[serde(default)]
    pub result: Option<Vec<u8>>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}
