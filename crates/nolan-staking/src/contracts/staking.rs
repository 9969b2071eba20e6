// crates/nolan-staking/src/contracts/staking.rs

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use nolan_common::{FunctionCall, ViewClient};

use crate::{amount::FixedPointAmount, Result, StakingError};

/// Binding for the staking contract
#[derive(Clone)]
pub struct StakingContract {
    view: Arc<dyn ViewClient>,
    contract_id: String,
}

impl StakingContract {
    pub fn new(view: Arc<dyn ViewClient>, contract_id: impl Into<String>) -> Self {
        Self {
            view,
            contract_id: contract_id.into(),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// Raw `has_stake` summary for `staker`; parsing is left to the caller.
    pub async fn has_stake(&self, staker: &str) -> Result<Value> {
        debug!("has_stake({}) on {}", staker, self.contract_id);
        Ok(self
            .view
            .view_function(&self.contract_id, "has_stake", json!({ "staker": staker }))
            .await?)
    }

    /// Flat reward rate. Opaque units, for display only.
    pub async fn reward_per_hour(&self) -> Result<f64> {
        let raw = self
            .view
            .view_function(&self.contract_id, "reward_per_hour", json!({}))
            .await?;
        raw.as_f64().ok_or_else(|| {
            StakingError::MalformedResponse(format!("reward_per_hour: expected a number, got {}", raw))
        })
    }

    pub async fn decimals(&self) -> Result<u32> {
        let raw = self
            .view
            .view_function(&self.contract_id, "decimals", json!({}))
            .await?;
        raw.as_u64()
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| {
                StakingError::MalformedResponse(format!("decimals: expected an integer, got {}", raw))
            })
    }

    pub fn withdraw_stake(&self, amount: &FixedPointAmount, stake_index: usize, gas: u64) -> FunctionCall {
        FunctionCall {
            receiver_id: self.contract_id.clone(),
            method_name: "withdraw_stake".to_string(),
            args: json!({
                "amount": amount.raw_units(),
                "stake_index": stake_index,
            }),
            gas,
            deposit: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nolan_common::traits::MockViewClient;

    #[tokio::test]
    async fn test_has_stake_uses_staker_key() {
        let mut view = MockViewClient::new();
        view.expect_view_function()
            .withf(|contract, method, args| {
                contract == "stake.testnet" && method == "has_stake" && args == &json!({"staker": "a.testnet"})
            })
            .times(1)
            .returning(|_, _, _| Ok(json!({"total_amount": "0", "stakes": []})));

        let contract = StakingContract::new(Arc::new(view), "stake.testnet");
        let raw = contract.has_stake("a.testnet").await.unwrap();
        assert_eq!(raw["total_amount"], "0");
    }

    #[tokio::test]
    async fn test_decimals_and_rate() {
        let mut view = MockViewClient::new();
        view.expect_view_function()
            .withf(|contract, method, _| contract == "stake.testnet" && method == "decimals")
            .returning(|_, _, _| Ok(json!(18)));
        view.expect_view_function()
            .withf(|_, method, args| method == "reward_per_hour" && args == &json!({}))
            .returning(|_, _, _| Ok(json!(0.015)));

        let contract = StakingContract::new(Arc::new(view), "stake.testnet");
        assert_eq!(contract.decimals().await.unwrap(), 18);
        assert!((contract.reward_per_hour().await.unwrap() - 0.015).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_malformed_decimals() {
        let mut view = MockViewClient::new();
        view.expect_view_function()
            .returning(|_, _, _| Ok(json!("eighteen")));

        let contract = StakingContract::new(Arc::new(view), "stake.testnet");
        assert!(matches!(
            contract.decimals().await,
            Err(StakingError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_view_failure_is_upstream() {
        let mut view = MockViewClient::new();
        view.expect_view_function()
            .returning(|_, _, _| Err(nolan_common::Error::Transport("connection reset".into())));

        let contract = StakingContract::new(Arc::new(view), "stake.testnet");
        assert!(matches!(
            contract.reward_per_hour().await,
            Err(StakingError::UpstreamError(_))
        ));
    }

    #[test]
    fn test_withdraw_call() {
        let contract = StakingContract::new(Arc::new(MockViewClient::new()), "stake.testnet");
        let amount = FixedPointAmount::from_raw("50000000000000000", 18).unwrap();
        let call = contract.withdraw_stake(&amount, 2, 100_000_000_000_000);

        assert_eq!(call.receiver_id, "stake.testnet");
        assert_eq!(call.method_name, "withdraw_stake");
        assert_eq!(call.args, json!({"amount": "50000000000000000", "stake_index": 2}));
        assert_eq!(call.deposit, 0);
    }
}
