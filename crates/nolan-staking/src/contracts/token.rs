// crates/nolan-staking/src/contracts/token.rs

use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use nolan_common::{FunctionCall, ViewClient};

use super::types::{FungibleTokenMetadata, StorageBalance};
use crate::{amount::FixedPointAmount, Result, StakingError};

/// Binding for the NEP-141 token contract being staked
#[derive(Clone)]
pub struct TokenContract {
    view: Arc<dyn ViewClient>,
    contract_id: String,
}

impl TokenContract {
    pub fn new(view: Arc<dyn ViewClient>, contract_id: impl Into<String>) -> Self {
        Self {
            view,
            contract_id: contract_id.into(),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub async fn storage_balance_of(&self, account_id: &str) -> Result<Option<StorageBalance>> {
        debug!("storage_balance_of({}) on {}", account_id, self.contract_id);
        let raw = self
            .view
            .view_function(
                &self.contract_id,
                "storage_balance_of",
                json!({ "account_id": account_id }),
            )
            .await?;
        StorageBalance::parse(&raw)
    }

    pub async fn ft_metadata(&self) -> Result<FungibleTokenMetadata> {
        let raw = self
            .view
            .view_function(&self.contract_id, "ft_metadata", json!({}))
            .await?;
        FungibleTokenMetadata::parse(&raw)
    }

    pub async fn ft_balance_of(&self, account_id: &str, scale: u32) -> Result<FixedPointAmount> {
        let raw = self
            .view
            .view_function(&self.contract_id, "ft_balance_of", json!({ "account_id": account_id }))
            .await?;
        FixedPointAmount::from_json(&raw, scale)
            .map_err(|e| StakingError::MalformedResponse(format!("ft_balance_of: {}", e)))
    }

    /// Transfer to `receiver_id` that the receiver handles via `ft_on_transfer(msg)`.
    pub fn ft_transfer_call(
        &self,
        receiver_id: &str,
        amount: &FixedPointAmount,
        msg: &str,
        gas: u64,
        deposit: u128,
    ) -> FunctionCall {
        FunctionCall {
            receiver_id: self.contract_id.clone(),
            method_name: "ft_transfer_call".to_string(),
            args: json!({
                "receiver_id": receiver_id,
                "amount": amount.raw_units(),
                "msg": msg,
            }),
            gas,
            deposit,
        }
    }

    pub fn storage_deposit(&self, account_id: &str, gas: u64, deposit: u128) -> FunctionCall {
        FunctionCall {
            receiver_id: self.contract_id.clone(),
            method_name: "storage_deposit".to_string(),
            args: json!({
                "account_id": account_id,
                "registration_only": true,
            }),
            gas,
            deposit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nolan_common::traits::MockViewClient;

    #[tokio::test]
    async fn test_storage_balance_of() {
        let mut view = MockViewClient::new();
        view.expect_view_function()
            .withf(|contract, method, args| {
                contract == "token.testnet"
                    && method == "storage_balance_of"
                    && args == &json!({"account_id": "a.testnet"})
            })
            .returning(|_, _, _| Ok(serde_json::Value::Null));

        let token = TokenContract::new(Arc::new(view), "token.testnet");
        assert_eq!(token.storage_balance_of("a.testnet").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ft_balance_of() {
        let mut view = MockViewClient::new();
        view.expect_view_function()
            .withf(|_, method, _| method == "ft_balance_of")
            .returning(|_, _, _| Ok(json!("6000000000000000000000")));

        let token = TokenContract::new(Arc::new(view), "token.testnet");
        let balance = token.ft_balance_of("a.testnet", 18).await.unwrap();
        assert_eq!(balance.to_display_decimal(3), "6000.000");
    }

    #[test]
    fn test_transfer_call_shape() {
        let token = TokenContract::new(Arc::new(MockViewClient::new()), "token.testnet");
        let amount = FixedPointAmount::from_raw("6000", 0).unwrap();
        let call = token.ft_transfer_call("stake.testnet", &amount, "staking", 300_000_000_000_000, 1);

        assert_eq!(call.receiver_id, "token.testnet");
        assert_eq!(
            call.args,
            json!({"receiver_id": "stake.testnet", "amount": "6000", "msg": "staking"})
        );
        assert_eq!(call.gas, 300_000_000_000_000);
        assert_eq!(call.deposit, 1);
    }
}
