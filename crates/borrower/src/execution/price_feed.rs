//! Chainlink AggregatorV3 reader.

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::debug;

use crate::errors::BorrowError;
use crate::types::RoundData;

use super::contracts::IAggregatorV3;
use super::traits::PriceFeed;
use super::tx_submitter::HttpProvider;

/// Reads `latestRoundData()` and `decimals()` from any AggregatorV3 feed.
pub struct ChainlinkFeed {
    provider: HttpProvider,
}

impl ChainlinkFeed {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

fn unavailable(feed: Address, call: &str, e: impl std::fmt::Display) -> BorrowError {
    BorrowError::OracleUnavailable {
        reason: format!("{call} on {feed} failed: {e}"),
    }
}

#[async_trait]
impl PriceFeed for ChainlinkFeed {
    async fn latest_round(&self, feed: Address) -> Result<RoundData, BorrowError> {
        let aggregator = IAggregatorV3::new(feed, self.provider.clone());

        let data = aggregator
            .latestRoundData()
            .call()
            .await
            .map_err(|e| unavailable(feed, "latestRoundData", e))?;

        let decimals = aggregator
            .decimals()
            .call()
            .await
            .map_err(|e| unavailable(feed, "decimals", e))?;

        let round = RoundData {
            round_id: data.roundId.to::<u128>(),
            answer: data.answer,
            updated_at: data.updatedAt.saturating_to::<u64>(),
            answered_in_round: data.answeredInRound.to::<u128>(),
            decimals,
        };

        debug!(
            feed = %feed,
            round_id = round.round_id,
            answer = %round.answer,
            updated_at = round.updated_at,
            "latest round"
        );

        Ok(round)
    }
}
