//! Account position reader.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::info;

use crate::errors::BorrowError;
use crate::execution::LendingPool;
use crate::types::AccountPosition;

use super::retry::RetryPolicy;

/// Fresh `getUserAccountData` snapshots. Never cached: every deposit or
/// borrow changes the figures.
pub struct PositionReader<P: LendingPool> {
    pool: Arc<P>,
    retry: RetryPolicy,
}

impl<P: LendingPool> PositionReader<P> {
    pub fn new(pool: Arc<P>, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub async fn account_position(&self, account: Address) -> Result<AccountPosition, BorrowError> {
        let pool = &self.pool;
        let position = self
            .retry
            .run("getUserAccountData", move || pool.account_position(account))
            .await?;

        info!(
            account = %account,
            total_collateral = %position.total_collateral,
            total_debt = %position.total_debt,
            available_to_borrow = %position.available_to_borrow,
            "position read"
        );
        Ok(position)
    }
}
