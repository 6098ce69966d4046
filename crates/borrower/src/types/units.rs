//! Conversions between human-entered token amounts and on-chain base units.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::BorrowError;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u8 = 28;

/// Convert a whole-unit amount (`0.02` WETH) to base units (`2e16` wei).
///
/// Exact: rejects amounts with more fractional digits than the token has.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, BorrowError> {
    if amount <= Decimal::ZERO {
        return Err(BorrowError::InvalidAmount {
            reason: format!("amount {amount} must be positive"),
        });
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > u32::from(decimals) {
        return Err(BorrowError::InvalidAmount {
            reason: format!("amount {amount} has more than {decimals} fractional digits"),
        });
    }

    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| BorrowError::InvalidAmount {
        reason: format!("amount {amount} is not representable"),
    })?;
    let multiplier = pow10(decimals - scale as u8)?;

    U256::from(mantissa)
        .checked_mul(multiplier)
        .ok_or(BorrowError::ArithmeticOverflow {
            context: "base unit conversion",
        })
}

/// Render base units as a whole-unit `Decimal` for logging.
///
/// Values too large for `Decimal` render as zero.
pub fn to_display_units(raw: U256, decimals: u8) -> Decimal {
    let raw_dec = Decimal::from_str(&raw.to_string()).unwrap_or_default();
    if decimals > MAX_DECIMAL_SCALE {
        return raw_dec;
    }
    (raw_dec * Decimal::new(1, u32::from(decimals))).normalize()
}

/// `10^exp` as `U256`.
pub fn pow10(exp: u8) -> Result<U256, BorrowError> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or(BorrowError::ArithmeticOverflow { context: "power of ten" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_base_units_ether() {
        let wei = to_base_units(dec!(0.02), 18).unwrap();
        assert_eq!(wei, U256::from(20_000_000_000_000_000u128));
    }

    #[test]
    fn test_to_base_units_whole() {
        assert_eq!(to_base_units(dec!(10), 0).unwrap(), U256::from(10u64));
        assert_eq!(to_base_units(dec!(1.5), 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn test_to_base_units_trailing_zeros_ok() {
        // 1.500000 normalizes to 1.5, fits in 1 decimal.
        assert_eq!(to_base_units(dec!(1.500000), 1).unwrap(), U256::from(15u64));
    }

    #[test]
    fn test_to_base_units_too_precise() {
        let err = to_base_units(dec!(0.0000001), 6).unwrap_err();
        assert!(matches!(err, BorrowError::InvalidAmount { .. }));
    }

    #[test]
    fn test_to_base_units_non_positive() {
        assert!(to_base_units(dec!(0), 18).is_err());
        assert!(to_base_units(dec!(-1), 18).is_err());
    }

    #[test]
    fn test_to_display_units() {
        let raw = U256::from(2_375_000_000_000_000_000u128);
        assert_eq!(to_display_units(raw, 18), dec!(2.375));
        assert_eq!(to_display_units(U256::from(7u64), 0), dec!(7));
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0).unwrap(), U256::from(1u64));
        assert_eq!(pow10(18).unwrap(), U256::from(1_000_000_000_000_000_000u128));
    }
}
