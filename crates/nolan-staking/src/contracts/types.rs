// crates/nolan-staking/src/contracts/types.rs

use serde::Deserialize;
use serde_json::Value;

use crate::{amount::FixedPointAmount, Result, StakingError};

/// Scale of NEAR balances (yoctoNEAR).
pub const NEAR_DECIMALS: u32 = 24;

/// NEP-145 storage balance of an account on the token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBalance {
    pub total: FixedPointAmount,
    pub available: FixedPointAmount,
}

/// NEP-148 fungible token metadata. Only the fields the client needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FungibleTokenMetadata {
    pub spec: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl StorageBalance {
    /// `storage_balance_of` returns `null` for unregistered accounts.
    pub fn parse(raw: &Value) -> Result<Option<Self>> {
        if raw.is_null() {
            return Ok(None);
        }

        let field = |name: &str| -> Result<FixedPointAmount> {
            let value = raw.get(name).ok_or_else(|| {
                StakingError::MalformedResponse(format!("storage_balance_of: missing {}", name))
            })?;
            FixedPointAmount::from_json(value, NEAR_DECIMALS).map_err(|e| {
                StakingError::MalformedResponse(format!("storage_balance_of.{}: {}", name, e))
            })
        };

        Ok(Some(Self {
            total: field("total")?,
            available: field("available")?,
        }))
    }

    pub fn is_registered(&self) -> bool {
        !self.total.is_zero()
    }
}

impl FungibleTokenMetadata {
    pub fn parse(raw: &Value) -> Result<Self> {
        Self::deserialize(raw)
            .map_err(|e| StakingError::MalformedResponse(format!("ft_metadata: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_balance() {
        assert_eq!(StorageBalance::parse(&Value::Null).unwrap(), None);

        let balance = StorageBalance::parse(&json!({
            "total": "1250000000000000000000",
            "available": "0"
        }))
        .unwrap()
        .unwrap();
        assert!(balance.is_registered());
        assert_eq!(balance.total.to_display_decimal(5), "0.00125");

        let empty = StorageBalance::parse(&json!({"total": "0", "available": "0"}))
            .unwrap()
            .unwrap();
        assert!(!empty.is_registered());

        assert!(matches!(
            StorageBalance::parse(&json!({"total": "1"})),
            Err(StakingError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_metadata() {
        let metadata = FungibleTokenMetadata::parse(&json!({
            "spec": "ft-1.0.0",
            "name": "Nolan",
            "symbol": "NLN",
            "icon": null,
            "decimals": 18
        }))
        .unwrap();
        assert_eq!(metadata.decimals, 18);

        assert!(matches!(
            FungibleTokenMetadata::parse(&json!({"spec": "ft-1.0.0", "name": "x", "symbol": "X"})),
            Err(StakingError::MalformedResponse(_))
        ));
    }
}
