//! Exact rational safety factor.
//!
//! Sizing never touches floating point: the configured decimal (`0.95`) is
//! turned into `95/100` once and applied with integer arithmetic.

use rust_decimal::Decimal;
use std::fmt;

use crate::errors::BorrowError;

/// Fraction strictly inside (0, 1), stored in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SafetyFactor {
    numerator: u128,
    denominator: u128,
}

impl SafetyFactor {
    pub fn new(numerator: u128, denominator: u128) -> Result<Self, BorrowError> {
        if numerator == 0 || numerator >= denominator {
            return Err(BorrowError::Config(format!(
                "safety factor {numerator}/{denominator} must lie strictly between 0 and 1"
            )));
        }
        let g = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / g,
            denominator: denominator / g,
        })
    }

    /// Build from a decimal such as `0.95`.
    pub fn from_decimal(value: Decimal) -> Result<Self, BorrowError> {
        if value <= Decimal::ZERO || value >= Decimal::ONE {
            return Err(BorrowError::Config(format!(
                "safety factor {value} must lie strictly between 0 and 1"
            )));
        }
        let numerator = u128::try_from(value.mantissa()).map_err(|_| {
            BorrowError::Config(format!("safety factor {value} is not representable"))
        })?;
        let denominator = 10u128.pow(value.scale());
        Self::new(numerator, denominator)
    }

    pub fn numerator(&self) -> u128 {
        self.numerator
    }

    pub fn denominator(&self) -> u128 {
        self.denominator
    }
}

impl fmt::Display for SafetyFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
