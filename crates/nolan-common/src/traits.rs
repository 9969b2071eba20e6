//! Collaborator seams the staking service is built on.
//!
//! The service never talks to a node or a wallet directly; it is handed
//! implementations of these traits at construction time.

use {
    async_trait::async_trait,
    serde_json::Value,
};

use crate::{
    errors::Result,
    types::{FunctionCall, TransactionOutcome},
};

/// Read access to contract view methods.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ViewClient: Send + Sync + 'static {
    /// Calls a view method on `contract_id` and returns its JSON result.
    async fn view_function(&self, contract_id: &str, method_name: &str, args: Value) -> Result<Value>;
}

/// An authenticated wallet session.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait WalletSession: Send + Sync + 'static {
    /// The signed-in account, or `None` before sign-in completes.
    fn account_id(&self) -> Option<String>;

    /// Starts the sign-in flow. Completion is observed through `account_id`.
    fn request_sign_in(&self);

    /// Signs `call` with the session key, submits it and waits for the outcome.
    async fn sign_and_submit(&self, call: FunctionCall) -> Result<TransactionOutcome>;
}
