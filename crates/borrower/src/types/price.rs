use alloy::primitives::{I256, U256};

/// Raw `latestRoundData()` result plus the feed's `decimals()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u128,
    /// Signed on-chain answer; only strictly positive values are usable.
    pub answer: I256,
    /// Unix seconds of the last update.
    pub updated_at: u64,
    pub answered_in_round: u128,
    pub decimals: u8,
}

/// Validated exchange rate used for borrow sizing.
///
/// `rate` is the feed answer: reference-currency base units per whole
/// borrow-asset unit, at the feed's precision. `scale` is
/// `10^(borrow_decimals + feed_decimals - reference_decimals)`, the single
/// re-scaling step that turns `reference / rate` into borrow-asset base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSample {
    pub rate: U256,
    pub scale: U256,
    pub round_id: u128,
    pub updated_at: u64,
}

impl PriceSample {
    /// Sample whose rate already converts reference units into borrow units.
    pub fn unscaled(rate: U256, round_id: u128, updated_at: u64) -> Self {
        Self {
            rate,
            scale: U256::from(1u64),
            round_id,
            updated_at,
        }
    }
}
