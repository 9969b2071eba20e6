//! Staking position as reported by the staking contract's `has_stake` view.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

use nolan_common::{
    utils::{format_datetime, timestamp_to_datetime},
    TimestampUnit,
};

use crate::{amount::FixedPointAmount, Result, StakingError};

/// A single stake entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeRecord {
    index: usize,
    owner_address: Option<String>,
    amount: FixedPointAmount,
    claimable: FixedPointAmount,
    since: u64,
    since_unit: TimestampUnit,
}

/// Every stake held by one account, in contract order.
///
/// `total_claimable` is the contract's own `total_amount` figure. It is kept
/// as reported and is not expected to equal the sum of per-stake values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingSnapshot {
    total_claimable: FixedPointAmount,
    stakes: Vec<StakeRecord>,
}

// Required fields are optional here so that absence and `null` both surface
// as MalformedResponse naming the field.
#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(default)]
    total_amount: Option<Value>,
    #[serde(default)]
    stakes: Option<Vec<RawStake>>,
}

#[derive(Debug, Deserialize)]
struct RawStake {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    claimable: Option<Value>,
    #[serde(default)]
    since: Option<Value>,
}

impl StakeRecord {
    /// Position in the snapshot, used as `stake_index` when withdrawing.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn owner_address(&self) -> Option<&str> {
        self.owner_address.as_deref()
    }

    pub fn amount(&self) -> &FixedPointAmount {
        &self.amount
    }

    pub fn claimable(&self) -> &FixedPointAmount {
        &self.claimable
    }

    /// Raw `since` value in the contract's timestamp unit.
    pub fn since_raw(&self) -> u64 {
        self.since
    }

    pub fn since(&self) -> Option<DateTime<Utc>> {
        timestamp_to_datetime(self.since, self.since_unit)
    }

    /// `since` rendered as `dd/mm/yyyy hh:mm UTC`, or `None` if it is out of range.
    pub fn since_display(&self) -> Option<String> {
        self.since().map(|at| format_datetime(&at))
    }

    /// Age of the stake at `now`, zero if `since` lies in the future.
    pub fn staked_for(&self, now: DateTime<Utc>) -> Duration {
        self.since()
            .map(|since| (now - since).max(Duration::zero()))
            .unwrap_or_else(Duration::zero)
    }

    pub fn display_amount(&self, precision: u32) -> String {
        self.amount.to_display_decimal(precision)
    }

    pub fn display_claimable(&self, precision: u32) -> String {
        self.claimable.to_display_decimal(precision)
    }
}

impl StakingSnapshot {
    /// Parses a `has_stake` payload whose `since` values are in milliseconds.
    pub fn parse(raw: &Value, on_chain_scale: u32) -> Result<Self> {
        Self::parse_with_unit(raw, on_chain_scale, TimestampUnit::Milliseconds)
    }

    pub fn parse_with_unit(raw: &Value, on_chain_scale: u32, since_unit: TimestampUnit) -> Result<Self> {
        let summary = RawSummary::deserialize(raw)
            .map_err(|e| StakingError::MalformedResponse(format!("has_stake: {}", e)))?;

        let total_claimable = parse_amount(summary.total_amount.as_ref(), "total_amount", on_chain_scale)?;

        let stakes = summary
            .stakes
            .ok_or_else(|| StakingError::MalformedResponse("missing stakes".into()))?
            .into_iter()
            .enumerate()
            .map(|(index, stake)| {
                let field = |name: &str| format!("stakes[{}].{}", index, name);
                let since = stake
                    .since
                    .as_ref()
                    .ok_or_else(|| StakingError::MalformedResponse(format!("missing {}", field("since"))))?;

                Ok(StakeRecord {
                    index,
                    amount: parse_amount(stake.amount.as_ref(), &field("amount"), on_chain_scale)?,
                    claimable: parse_amount(stake.claimable.as_ref(), &field("claimable"), on_chain_scale)?,
                    since: parse_timestamp(since).ok_or_else(|| {
                        StakingError::MalformedResponse(format!(
                            "{} is not a timestamp: {}",
                            field("since"),
                            since
                        ))
                    })?,
                    since_unit,
                    owner_address: stake.address,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            total_claimable,
            stakes,
        })
    }

    pub fn total_claimable(&self) -> &FixedPointAmount {
        &self.total_claimable
    }

    pub fn stakes(&self) -> &[StakeRecord] {
        &self.stakes
    }

    pub fn stake(&self, index: usize) -> Result<&StakeRecord> {
        self.stakes.get(index).ok_or(StakingError::InvalidIndex {
            index,
            len: self.stakes.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }
}

fn parse_amount(value: Option<&Value>, field: &str, scale: u32) -> Result<FixedPointAmount> {
    let value = value.ok_or_else(|| StakingError::MalformedResponse(format!("missing {}", field)))?;
    FixedPointAmount::from_json(value, scale)
        .map_err(|e| StakingError::MalformedResponse(format!("{}: {}", field, e)))
}

// u64 timestamps may arrive as numbers or, U64-style, as strings
fn parse_timestamp(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn e2e_payload() -> Value {
        json!({
            "total_amount": "3000000000000000000",
            "stakes": [{
                "amount": "1000000000000000000",
                "claimable": "50000000000000000",
                "since": 1650000000000u64,
                "address": "a.testnet"
            }]
        })
    }

    #[test]
    fn test_parse_empty() {
        let snapshot = StakingSnapshot::parse(&json!({"total_amount": "500", "stakes": []}), 18).unwrap();

        assert!(snapshot.is_empty());
        assert_eq!(
            snapshot.total_claimable().to_display_decimal(18),
            FixedPointAmount::from_raw("500", 18).unwrap().to_display_decimal(18)
        );
    }

    #[test]
    fn test_parse_end_to_end() {
        let snapshot = StakingSnapshot::parse(&e2e_payload(), 18).unwrap();

        assert_eq!(snapshot.total_claimable().to_display_decimal(3), "3.000");
        assert_eq!(snapshot.len(), 1);

        let stake = snapshot.stake(0).unwrap();
        assert_eq!(stake.index(), 0);
        assert_eq!(stake.owner_address(), Some("a.testnet"));
        assert_eq!(stake.display_amount(3), "1.000");
        assert_eq!(stake.display_claimable(3), "0.050");
        assert_eq!(stake.since_raw(), 1_650_000_000_000);
        assert_eq!(
            stake.since().unwrap().to_rfc3339(),
            "2022-04-15T05:20:00+00:00"
        );
        assert_eq!(stake.since_display().as_deref(), Some("15/04/2022 05:20 UTC"));
    }

    #[test]
    fn test_total_is_not_recomputed() {
        // total_amount deliberately disagrees with the per-stake values
        let raw = json!({
            "total_amount": "7",
            "stakes": [
                {"amount": "100", "claimable": "5", "since": 1},
                {"amount": "200", "claimable": "6", "since": 2}
            ]
        });
        let snapshot = StakingSnapshot::parse(&raw, 0).unwrap();

        assert_eq!(snapshot.total_claimable().raw_units(), "7");
        assert_eq!(snapshot.stake(1).unwrap().claimable().raw_units(), "6");
    }

    #[test]
    fn test_missing_total_is_malformed() {
        let raw = json!({"stakes": []});
        assert!(matches!(
            StakingSnapshot::parse(&raw, 18),
            Err(StakingError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        let cases = [
            json!({"total_amount": "1", "stakes": {}}),
            json!({"total_amount": "1"}),
            json!({"total_amount": "1", "stakes": [{"claimable": "1", "since": 1}]}),
            json!({"total_amount": "1", "stakes": [{"amount": "1", "since": 1}]}),
            json!({"total_amount": "1", "stakes": [{"amount": "1", "claimable": "1"}]}),
            json!({"total_amount": "1", "stakes": [{"amount": "-1", "claimable": "1", "since": 1}]}),
            json!({"total_amount": "1", "stakes": [{"amount": "1", "claimable": "0.5", "since": 1}]}),
            json!({"total_amount": "1", "stakes": [{"amount": "1", "claimable": "1", "since": "soon"}]}),
            json!({"total_amount": null, "stakes": []}),
            json!({"total_amount": "abc", "stakes": []}),
            json!(null),
            json!([]),
        ];

        for raw in cases {
            assert!(
                matches!(StakingSnapshot::parse(&raw, 18), Err(StakingError::MalformedResponse(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_index_out_of_bounds() {
        let snapshot = StakingSnapshot::parse(&e2e_payload(), 18).unwrap();
        assert!(matches!(
            snapshot.stake(1),
            Err(StakingError::InvalidIndex { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_nanosecond_timestamps() {
        let raw = json!({
            "total_amount": "0",
            "stakes": [{"amount": "1", "claimable": "0", "since": "1650000000000000000"}]
        });
        let snapshot = StakingSnapshot::parse_with_unit(&raw, 0, TimestampUnit::Nanoseconds).unwrap();
        let stake = snapshot.stake(0).unwrap();

        assert_eq!(stake.owner_address(), None);
        let since = stake.since().unwrap();
        assert_eq!(since.timestamp(), 1_650_000_000);
        assert_eq!(stake.staked_for(since + Duration::hours(2)), Duration::hours(2));
        assert_eq!(stake.staked_for(since - Duration::hours(2)), Duration::zero());
    }
}
