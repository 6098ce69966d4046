use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{RATE_MODE_STABLE, RATE_MODE_VARIABLE};
use crate::errors::BorrowError;

/// Amount in the smallest unit of its asset (wei-equivalent).
pub type Amount = U256;

/// Result of `LendingPool.getUserAccountData()`.
///
/// The first three figures are in the reference currency (ETH wei on Aave
/// V2). A snapshot: any deposit or borrow invalidates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPosition {
    pub total_collateral: Amount,
    pub total_debt: Amount,
    pub available_to_borrow: Amount,
    /// Weighted liquidation threshold in basis points.
    pub current_liquidation_threshold: U256,
    /// Weighted loan-to-value in basis points.
    pub ltv: U256,
    /// Health factor, WAD-scaled (1e18 = 1.0).
    pub health_factor: U256,
}

impl AccountPosition {
    /// Position with only the three sizing figures populated.
    pub fn new(total_collateral: Amount, total_debt: Amount, available_to_borrow: Amount) -> Self {
        Self {
            total_collateral,
            total_debt,
            available_to_borrow,
            current_liquidation_threshold: U256::ZERO,
            ltv: U256::ZERO,
            health_factor: U256::MAX,
        }
    }
}

/// Aave interest rate mode for borrow and repay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    Stable,
    Variable,
}

impl RateMode {
    /// On-chain `interestRateMode` value.
    pub fn code(self) -> u8 {
        match self {
            Self::Stable => RATE_MODE_STABLE,
            Self::Variable => RATE_MODE_VARIABLE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Variable => "variable",
        }
    }

    /// Stable-rate borrowing is deprecated protocol-side; refuse it rather
    /// than substituting the variable mode.
    pub fn ensure_supported(self) -> Result<Self, BorrowError> {
        match self {
            Self::Variable => Ok(self),
            Self::Stable => Err(BorrowError::UnsupportedRateMode { mode: self.code() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_mode_codes() {
        assert_eq!(RateMode::Stable.code(), 1);
        assert_eq!(RateMode::Variable.code(), 2);
    }

    #[test]
    fn test_stable_rate_rejected() {
        let err = RateMode::Stable.ensure_supported().unwrap_err();
        assert!(matches!(err, BorrowError::UnsupportedRateMode { mode: 1 }));
        assert_eq!(RateMode::Variable.ensure_supported().unwrap(), RateMode::Variable);
    }

    #[test]
    fn test_rate_mode_deserialize() {
        let mode: RateMode = serde_json::from_str("\"variable\"").unwrap();
        assert_eq!(mode, RateMode::Variable);
        assert!(serde_json::from_str::<RateMode>("\"fixed\"").is_err());
    }
}
