//! Borrow amount calculator.
//!
//! ```text
//! amount = floor(available * safety_num * scale / (safety_den * rate))
//! ```
//!
//! `available` is the reference-currency capacity from the position read,
//! `rate` the feed answer (reference units per whole borrow unit) and
//! `scale` the decimal adjustment carried on the `PriceSample`. A single
//! floor at the end keeps the result conservative: `amount * rate` never
//! exceeds what the safety factor allows.

use alloy::primitives::U256;

use crate::errors::BorrowError;
use crate::types::{AccountPosition, Amount, PriceSample, SafetyFactor};

pub fn compute_borrow_amount(
    position: &AccountPosition,
    price: &PriceSample,
    safety: SafetyFactor,
) -> Result<Amount, BorrowError> {
    if price.rate.is_zero() {
        return Err(BorrowError::InvalidPrice {
            rate: price.rate.to_string(),
        });
    }
    if position.available_to_borrow.is_zero() {
        return Ok(U256::ZERO);
    }

    let numerator = position
        .available_to_borrow
        .checked_mul(U256::from(safety.numerator()))
        .and_then(|v| v.checked_mul(price.scale))
        .ok_or(BorrowError::ArithmeticOverflow {
            context: "borrow sizing numerator",
        })?;
    let denominator = U256::from(safety.denominator())
        .checked_mul(price.rate)
        .ok_or(BorrowError::ArithmeticOverflow {
            context: "borrow sizing denominator",
        })?;

    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn position(available: u128) -> AccountPosition {
        AccountPosition::new(U256::from(10u64), U256::ZERO, U256::from(available))
    }

    fn safety() -> SafetyFactor {
        SafetyFactor::from_decimal(dec!(0.95)).unwrap()
    }

    #[test]
    fn test_small_integer_scenario() {
        // floor(5 * 0.95 / 2) = floor(2.375) = 2
        let price = PriceSample::unscaled(U256::from(2u64), 1, 0);
        let amount = compute_borrow_amount(&position(5), &price, safety()).unwrap();
        assert_eq!(amount, U256::from(2u64));
    }

    #[test]
    fn test_zero_capacity_sizes_zero() {
        let price = PriceSample::unscaled(U256::from(2u64), 1, 0);
        let amount = compute_borrow_amount(&position(0), &price, safety()).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_zero_rate_rejected() {
        let price = PriceSample::unscaled(U256::ZERO, 1, 0);
        let err = compute_borrow_amount(&position(5), &price, safety()).unwrap_err();
        assert!(matches!(err, BorrowError::InvalidPrice { .. }));
    }

    #[test]
    fn test_dai_against_eth_feed() {
        // 1 ETH of capacity, 1 DAI = 0.0005 ETH (18-decimal feed):
        // 1 / 0.0005 * 0.95 = 1900 DAI.
        let one_eth = 1_000_000_000_000_000_000u128;
        let price = PriceSample {
            rate: U256::from(500_000_000_000_000u64),
            scale: U256::from(one_eth),
            round_id: 1,
            updated_at: 0,
        };
        let amount = compute_borrow_amount(&position(one_eth), &price, safety()).unwrap();
        assert_eq!(amount, U256::from(1_900u128 * one_eth));
    }

    #[test]
    fn test_six_decimal_borrow_asset() {
        // 0.5 ETH of capacity, 1 USDC = 0.0004 ETH: 0.5 / 0.0004 * 0.95 = 1187.5 USDC.
        let price = PriceSample {
            rate: U256::from(400_000_000_000_000u64),
            scale: U256::from(1_000_000u64),
            round_id: 1,
            updated_at: 0,
        };
        let amount =
            compute_borrow_amount(&position(500_000_000_000_000_000), &price, safety()).unwrap();
        assert_eq!(amount, U256::from(1_187_500_000u64));
    }

    #[test]
    fn test_overflow_detected() {
        let position = AccountPosition::new(U256::ZERO, U256::ZERO, U256::MAX);
        let price = PriceSample::unscaled(U256::from(1u64), 1, 0);
        let err = compute_borrow_amount(&position, &price, safety()).unwrap_err();
        assert!(matches!(err, BorrowError::ArithmeticOverflow { .. }));
    }

    proptest! {
        #[test]
        fn matches_integer_floor(
            available in 0u64..u64::MAX,
            rate in 1u64..u64::MAX,
            numerator in 1u32..1000u32,
        ) {
            let safety = SafetyFactor::new(u128::from(numerator), 1000).unwrap();
            let amount = compute_borrow_amount(
                &position(u128::from(available)),
                &PriceSample::unscaled(U256::from(rate), 1, 0),
                safety,
            ).unwrap();
            let expected =
                u128::from(available) * u128::from(numerator) / (1000 * u128::from(rate));
            prop_assert_eq!(amount, U256::from(expected));
        }

        #[test]
        fn never_exceeds_scaled_capacity(
            available in 1u64..u64::MAX,
            rate in 1u64..1_000_000u64,
        ) {
            let amount = compute_borrow_amount(
                &position(u128::from(available)),
                &PriceSample::unscaled(U256::from(rate), 1, 0),
                safety(),
            ).unwrap();
            // amount * rate <= available * 0.95
            let spent = amount * U256::from(rate) * U256::from(20u64);
            prop_assert!(spent <= U256::from(available) * U256::from(19u64));
        }
    }
}
