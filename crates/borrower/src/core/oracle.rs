//! Price oracle reader.
//!
//! Turns a raw Chainlink round into a `PriceSample` the sizer can trust:
//! the answer must be strictly positive and, unless disabled, no older than
//! `max_age` seconds.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::errors::BorrowError;
use crate::execution::PriceFeed;
use crate::types::units::pow10;
use crate::types::{PriceSample, RoundData};

use super::retry::RetryPolicy;

pub struct PriceOracle<F: PriceFeed> {
    feed: Arc<F>,
    retry: RetryPolicy,
    max_age: Option<u64>,
    borrow_decimals: u8,
    reference_decimals: u8,
}

impl<F: PriceFeed> PriceOracle<F> {
    pub fn new(
        feed: Arc<F>,
        retry: RetryPolicy,
        max_age: Option<u64>,
        borrow_decimals: u8,
        reference_decimals: u8,
    ) -> Self {
        Self {
            feed,
            retry,
            max_age,
            borrow_decimals,
            reference_decimals,
        }
    }

    /// Latest validated rate from `feed`.
    pub async fn latest_price(&self, feed: Address) -> Result<PriceSample, BorrowError> {
        let source = &self.feed;
        let round = self
            .retry
            .run("latestRoundData", move || source.latest_round(feed))
            .await?;

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let sample = validate_round(
            &round,
            now,
            self.max_age,
            self.borrow_decimals,
            self.reference_decimals,
        )?;

        info!(
            feed = %feed,
            rate = %sample.rate,
            round_id = sample.round_id,
            age_seconds = now.saturating_sub(sample.updated_at),
            "price read"
        );
        Ok(sample)
    }
}

/// Check a round and derive the sizing scale.
///
/// `scale = 10^(borrow_decimals + feed_decimals - reference_decimals)`; a
/// negative exponent would need a division and is refused as misconfiguration.
pub fn validate_round(
    round: &RoundData,
    now: u64,
    max_age: Option<u64>,
    borrow_decimals: u8,
    reference_decimals: u8,
) -> Result<PriceSample, BorrowError> {
    if !round.answer.is_positive() {
        return Err(BorrowError::InvalidPrice {
            rate: round.answer.to_string(),
        });
    }

    if let Some(max_seconds) = max_age {
        let age_seconds = now.saturating_sub(round.updated_at);
        if age_seconds > max_seconds {
            return Err(BorrowError::StalePrice {
                age_seconds,
                max_seconds,
            });
        }
    }

    if round.answered_in_round < round.round_id {
        warn!(
            round_id = round.round_id,
            answered_in_round = round.answered_in_round,
            "oracle round incomplete, answer carried from an earlier round"
        );
    }

    let exponent = u16::from(borrow_decimals) + u16::from(round.decimals);
    let exponent = exponent
        .checked_sub(u16::from(reference_decimals))
        .ok_or_else(|| {
            BorrowError::Config(format!(
                "feed decimals {} with borrow decimals {borrow_decimals} cannot express \
                 reference decimals {reference_decimals}",
                round.decimals
            ))
        })?;
    let exponent = u8::try_from(exponent)
        .map_err(|_| BorrowError::ArithmeticOverflow { context: "price scale" })?;

    Ok(PriceSample {
        rate: round.answer.into_raw(),
        scale: pow10(exponent)?,
        round_id: round.round_id,
        updated_at: round.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{oracle_down, FakeChain, ACCOUNT, FEED};
    use alloy::primitives::{I256, U256};

    const NOW: u64 = 1_700_000_000;

    fn round(answer: i64, updated_at: u64, decimals: u8) -> RoundData {
        RoundData {
            round_id: 10,
            answer: I256::try_from(answer).unwrap(),
            updated_at,
            answered_in_round: 10,
            decimals,
        }
    }

    #[test]
    fn test_positive_fresh_round_accepted() {
        let sample = validate_round(&round(2, NOW - 10, 0), NOW, Some(3600), 18, 18).unwrap();
        assert_eq!(sample.rate, U256::from(2u64));
        assert_eq!(sample.scale, U256::from(1u64));
        assert_eq!(sample.round_id, 10);
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        for answer in [0, -1, -500] {
            let err = validate_round(&round(answer, NOW, 0), NOW, None, 18, 18).unwrap_err();
            assert!(matches!(err, BorrowError::InvalidPrice { .. }), "answer {answer}");
        }
    }

    #[test]
    fn test_stale_round_rejected() {
        let err = validate_round(&round(2, NOW - 3601, 0), NOW, Some(3600), 18, 18).unwrap_err();
        assert!(matches!(
            err,
            BorrowError::StalePrice {
                age_seconds: 3601,
                max_seconds: 3600
            }
        ));
    }

    #[test]
    fn test_staleness_disabled() {
        assert!(validate_round(&round(2, 0, 0), NOW, None, 18, 18).is_ok());
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        assert!(validate_round(&round(2, NOW + 30, 0), NOW, Some(60), 18, 18).is_ok());
    }

    #[test]
    fn test_chainlink_dai_eth_scale() {
        // DAI (18) priced in ETH (18) by an 18-decimal feed.
        let data = round(500_000_000_000_000, NOW, 18);
        let sample = validate_round(&data, NOW, None, 18, 18).unwrap();
        assert_eq!(sample.scale, U256::from(10u64).pow(U256::from(18u64)));
    }

    #[test]
    fn test_usdc_eth_scale() {
        // USDC (6) priced in ETH (18) by an 18-decimal feed.
        let data = round(400_000_000_000_000, NOW, 18);
        let sample = validate_round(&data, NOW, None, 6, 18).unwrap();
        assert_eq!(sample.scale, U256::from(1_000_000u64));
    }

    #[test]
    fn test_negative_scale_exponent_is_config_error() {
        let err = validate_round(&round(1, NOW, 0), NOW, None, 6, 18).unwrap_err();
        assert!(matches!(err, BorrowError::Config(_)));
    }

    #[test]
    fn test_incomplete_round_still_usable() {
        let mut r = round(2, NOW, 0);
        r.answered_in_round = 9;
        assert!(validate_round(&r, NOW, None, 18, 18).is_ok());
    }

    #[tokio::test]
    async fn test_latest_price_retries_transient_reads() {
        let chain = Arc::new(FakeChain::new(ACCOUNT, 0, 2).fail("latest_round", 0..2, oracle_down));
        let oracle = PriceOracle::new(chain.clone(), RetryPolicy::immediate(3), Some(3600), 18, 18);
        let sample = oracle.latest_price(FEED).await.unwrap();
        assert_eq!(sample.rate, U256::from(2u64));
        assert_eq!(chain.count("latest_round"), 3);
    }

    #[tokio::test]
    async fn test_latest_price_gives_up() {
        let chain =
            Arc::new(FakeChain::new(ACCOUNT, 0, 2).fail("latest_round", 0..10, oracle_down));
        let oracle = PriceOracle::new(chain.clone(), RetryPolicy::immediate(2), None, 18, 18);
        let err = oracle.latest_price(FEED).await.unwrap_err();
        assert!(matches!(err, BorrowError::OracleUnavailable { .. }));
        assert_eq!(chain.count("latest_round"), 2);
    }

    #[tokio::test]
    async fn test_latest_price_stale_not_retried() {
        let chain = Arc::new(FakeChain::new(ACCOUNT, 0, 2).with_updated_at(1));
        let oracle = PriceOracle::new(chain.clone(), RetryPolicy::immediate(3), Some(60), 18, 18);
        let err = oracle.latest_price(FEED).await.unwrap_err();
        assert!(matches!(err, BorrowError::StalePrice { .. }));
        assert_eq!(chain.count("latest_round"), 1);
    }
}
