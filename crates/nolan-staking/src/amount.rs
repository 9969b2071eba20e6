//! Fixed-point token amounts.
//!
//! Contracts report balances as integers in the token's smallest unit. A
//! [`FixedPointAmount`] pairs that integer with its base-10 scale so it can be
//! shown to users and converted back without ever passing through `f64`.
//! Every conversion towards display truncates: a balance is never shown as
//! larger than it is.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};
use serde_json::Value;
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{Result, StakingError};

/// Bounds the decimal exponent accepted in input such as `1e30` or `1e-30`.
const MAX_DECIMAL_EXPONENT: i64 = 128;

/// A non-negative integer amount of smallest units together with its scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixedPointAmount {
    raw_units: BigUint,
    scale: u32,
}

impl FixedPointAmount {
    /// Wraps a smallest-unit integer given as decimal text.
    pub fn from_raw(raw_units: &str, scale: u32) -> Result<Self> {
        Ok(Self {
            raw_units: parse_integral(raw_units)?,
            scale,
        })
    }

    pub fn from_units(raw_units: u128, scale: u32) -> Self {
        Self {
            raw_units: BigUint::from(raw_units),
            scale,
        }
    }

    pub fn zero(scale: u32) -> Self {
        Self {
            raw_units: BigUint::zero(),
            scale,
        }
    }

    /// Wraps a JSON string or number holding a smallest-unit integer.
    pub fn from_json(value: &Value, scale: u32) -> Result<Self> {
        match value {
            Value::String(text) => Self::from_raw(text, scale),
            Value::Number(number) => Self::from_raw(&number.to_string(), scale),
            other => Err(StakingError::InvalidAmount(format!(
                "expected an integer string or number, got {}",
                other
            ))),
        }
    }

    /// Parses a user-entered display value into smallest units at `scale`.
    pub fn from_display(display_value: &str, scale: u32) -> Result<Self> {
        Ok(Self {
            raw_units: shift_display(display_value, scale)?,
            scale,
        })
    }

    /// Converts a display value to the integer string a contract expects,
    /// dropping any digits beyond `target_scale`.
    pub fn to_on_chain_units(display_value: &str, target_scale: u32) -> Result<String> {
        Ok(shift_display(display_value, target_scale)?.to_string())
    }

    /// Renders `raw_units / 10^scale` with exactly `precision` fractional
    /// digits, truncated toward zero.
    pub fn to_display_decimal(&self, precision: u32) -> String {
        let shifted = if precision <= self.scale {
            &self.raw_units / ten_pow(self.scale - precision)
        } else {
            &self.raw_units * ten_pow(precision - self.scale)
        };

        let digits = shifted.to_string();
        if precision == 0 {
            return digits;
        }

        let precision = precision as usize;
        let padded = if digits.len() <= precision {
            format!("{}{}", "0".repeat(precision + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (whole, fraction) = padded.split_at(padded.len() - precision);
        format!("{}.{}", whole, fraction)
    }

    /// Sums two amounts of the same scale.
    pub fn add(&self, other: &FixedPointAmount) -> Result<FixedPointAmount> {
        self.ensure_same_scale(other)?;
        Ok(Self {
            raw_units: &self.raw_units + &other.raw_units,
            scale: self.scale,
        })
    }

    /// Compares two amounts of the same scale.
    pub fn checked_cmp(&self, other: &FixedPointAmount) -> Result<Ordering> {
        self.ensure_same_scale(other)?;
        Ok(self.raw_units.cmp(&other.raw_units))
    }

    /// Compares the amount with an exact display value, before any truncation
    /// of the value's extra fractional digits.
    pub fn cmp_display(&self, display_value: &str) -> Result<Ordering> {
        let value = parse_decimal(display_value)?;
        let own = BigDecimal::new(BigInt::from(self.raw_units.clone()), i64::from(self.scale));
        Ok(own.cmp(&value))
    }

    /// Re-expresses the amount at `target_scale`, truncating when the scale shrinks.
    pub fn rescale(&self, target_scale: u32) -> FixedPointAmount {
        let raw_units = match target_scale.cmp(&self.scale) {
            Ordering::Equal => self.raw_units.clone(),
            Ordering::Greater => &self.raw_units * ten_pow(target_scale - self.scale),
            Ordering::Less => &self.raw_units / ten_pow(self.scale - target_scale),
        };
        Self {
            raw_units,
            scale: target_scale,
        }
    }

    /// Smallest-unit integer as decimal text, as sent to contracts.
    pub fn raw_units(&self) -> String {
        self.raw_units.to_string()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.raw_units.is_zero()
    }

    fn ensure_same_scale(&self, other: &FixedPointAmount) -> Result<()> {
        if self.scale != other.scale {
            return Err(StakingError::ScaleMismatch {
                left: self.scale,
                right: other.scale,
            });
        }
        Ok(())
    }
}

impl fmt::Display for FixedPointAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_decimal(self.scale))
    }
}

fn ten_pow(exponent: u32) -> BigUint {
    num_traits::pow(BigUint::from(10u32), exponent as usize)
}

fn parse_decimal(text: &str) -> Result<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StakingError::InvalidAmount("empty amount".into()));
    }

    let value = BigDecimal::from_str(trimmed)
        .map_err(|_| StakingError::InvalidAmount(format!("{:?} is not numeric", text)))?;

    if value.is_negative() {
        return Err(StakingError::InvalidAmount(format!("{:?} is negative", text)));
    }

    let (_, scale) = value.as_bigint_and_exponent();
    if scale.abs() > MAX_DECIMAL_EXPONENT {
        return Err(StakingError::InvalidAmount(format!("{:?} is out of range", text)));
    }

    Ok(value)
}

fn parse_integral(text: &str) -> Result<BigUint> {
    let value = parse_decimal(text)?;
    let integral = value.with_scale(0);
    if integral != value {
        return Err(StakingError::InvalidAmount(format!(
            "{:?} is not a whole number of units",
            text
        )));
    }
    to_biguint(integral, text)
}

fn shift_display(display_value: &str, scale: u32) -> Result<BigUint> {
    let value = parse_decimal(display_value)?;
    let factor = BigDecimal::new(BigInt::one(), -i64::from(scale));
    // with_scale(0) drops the residual fraction (toward zero)
    to_biguint((value * factor).with_scale(0), display_value)
}

fn to_biguint(value: BigDecimal, text: &str) -> Result<BigUint> {
    let (digits, _) = value.into_bigint_and_exponent();
    digits
        .to_biguint()
        .ok_or_else(|| StakingError::InvalidAmount(format!("{:?} is negative", text)))
}
