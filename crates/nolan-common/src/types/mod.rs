//! Data types shared between the service and its collaborators

use serde::{Deserialize, Serialize};

/// A change-method invocation handed to the wallet for signing and submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub receiver_id: String,
    pub method_name: String,
    pub args: serde_json::Value,
    pub gas: u64,
    /// Attached deposit in yoctoNEAR.
    pub deposit: u128,
}

impl FunctionCall {
    /// Renders the call as an equivalent `near call` command line.
    pub fn to_near_cli(&self, signer_id: &str) -> String {
        format!(
            "near call {} {} '{}' --accountId {} --gas {} --depositYocto {}",
            self.receiver_id, self.method_name, self.args, signer_id, self.gas, self.deposit
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Succeeded,
    Failed(String),
}

/// Final outcome of a submitted change call as reported by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub transaction_hash: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Succeeded
    }
}
