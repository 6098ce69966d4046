//! Borrow-cycle orchestrator.
//!
//! Drives one collateralized borrow from deposit to repayment:
//!
//! ```text
//! START → DEPOSITED → POSITION_KNOWN → PRICED → SIZED → BORROWED → REPAID → DONE
//! ```
//!
//! Every step starts only after the previous one is confirmed on chain. The
//! first failure halts the machine in `FAILED(kind)`. Confirmed operations
//! are never rolled back; the report carries the last confirmed state so an
//! operator can finish by hand (e.g. a manual repay).

use std::sync::Arc;

use alloy::primitives::Address;
use thiserror::Error;
use tracing::{error, info};

use crate::errors::{BorrowError, FailureKind};
use crate::execution::{Erc20Token, LendingPool, PriceFeed};
use crate::types::{
    AccountPosition, Amount, Confirmation, PriceSample, RateMode, SafetyFactor, WorkflowState,
};

use super::approval::ApprovalGate;
use super::borrow_sizing::compute_borrow_amount;
use super::oracle::PriceOracle;
use super::position::PositionReader;
use super::retry::RetryPolicy;

/// What one cycle deposits and borrows.
#[derive(Debug, Clone)]
pub struct CycleParams {
    pub account: Address,
    pub collateral_asset: Address,
    /// Collateral in base units.
    pub collateral_amount: Amount,
    pub borrow_asset: Address,
    pub price_feed: Address,
    pub safety_factor: SafetyFactor,
    pub rate_mode: RateMode,
    pub referral_code: u16,
}

/// Read-side tuning shared by the oracle and position readers.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    pub retry: RetryPolicy,
    /// `None` disables the staleness check.
    pub max_price_age: Option<u64>,
    pub borrow_decimals: u8,
    pub reference_decimals: u8,
}

/// Everything observed by a successful cycle.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub collateral_amount: Amount,
    pub borrowed: Amount,
    pub price: PriceSample,
    pub initial_position: AccountPosition,
    /// Snapshot between borrow and repay.
    pub post_borrow_position: AccountPosition,
    pub final_position: AccountPosition,
    pub confirmations: Vec<Confirmation>,
}

#[derive(Debug, Error)]
#[error("borrow cycle failed after {last_state}: {error}")]
pub struct WorkflowFailure {
    pub kind: FailureKind,
    /// Last state whose on-chain effects are confirmed.
    pub last_state: WorkflowState,
    /// Transactions confirmed before the failure, in submission order.
    pub confirmations: Vec<Confirmation>,
    #[source]
    pub error: BorrowError,
}

#[derive(Debug)]
pub struct WorkflowReport {
    /// Every state entered, in order, including the terminal one.
    pub trail: Vec<WorkflowState>,
    pub outcome: Result<CycleSummary, WorkflowFailure>,
}

impl WorkflowReport {
    pub fn final_state(&self) -> WorkflowState {
        self.trail.last().copied().unwrap_or(WorkflowState::Start)
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// State cursor plus everything confirmed so far.
struct Progress {
    state: WorkflowState,
    trail: Vec<WorkflowState>,
    confirmations: Vec<Confirmation>,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: WorkflowState::Start,
            trail: vec![WorkflowState::Start],
            confirmations: Vec::new(),
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            info!(from = %self.state, to = %next, "state transition");
            self.state = next;
            self.trail.push(next);
        }
    }

    fn record(&mut self, confirmation: Confirmation) {
        self.confirmations.push(confirmation);
    }
}

pub struct BorrowWorkflow<T: Erc20Token, P: LendingPool, F: PriceFeed> {
    approvals: ApprovalGate<T>,
    pool: Arc<P>,
    positions: PositionReader<P>,
    oracle: PriceOracle<F>,
    params: CycleParams,
}

impl<T: Erc20Token, P: LendingPool, F: PriceFeed> BorrowWorkflow<T, P, F> {
    pub fn new(
        token: Arc<T>,
        pool: Arc<P>,
        feed: Arc<F>,
        settings: WorkflowSettings,
        params: CycleParams,
    ) -> Self {
        Self {
            approvals: ApprovalGate::new(token, settings.retry),
            positions: PositionReader::new(pool.clone(), settings.retry),
            oracle: PriceOracle::new(
                feed,
                settings.retry,
                settings.max_price_age,
                settings.borrow_decimals,
                settings.reference_decimals,
            ),
            pool,
            params,
        }
    }

    /// Run the cycle to a terminal state. Never panics on chain failures;
    /// they end up in the report.
    pub async fn run(&self) -> WorkflowReport {
        let mut progress = Progress::new();
        info!(
            account = %self.params.account,
            collateral_asset = %self.params.collateral_asset,
            collateral_amount = %self.params.collateral_amount,
            borrow_asset = %self.params.borrow_asset,
            safety_factor = %self.params.safety_factor,
            "borrow cycle starting"
        );

        match self.drive(&mut progress).await {
            Ok(summary) => {
                info!(
                    borrowed = %summary.borrowed,
                    transactions = summary.confirmations.len(),
                    "borrow cycle complete"
                );
                WorkflowReport {
                    trail: progress.trail,
                    outcome: Ok(summary),
                }
            }
            Err(e) => {
                let kind = e.kind();
                let last_state = progress.state;
                error!(
                    last_state = %last_state,
                    reason = ?kind,
                    confirmed_transactions = progress.confirmations.len(),
                    error = %e,
                    "borrow cycle failed"
                );
                progress.trail.push(WorkflowState::Failed(kind));
                WorkflowReport {
                    trail: progress.trail,
                    outcome: Err(WorkflowFailure {
                        kind,
                        last_state,
                        confirmations: progress.confirmations,
                        error: e,
                    }),
                }
            }
        }
    }

    async fn drive(&self, progress: &mut Progress) -> Result<CycleSummary, BorrowError> {
        let p = &self.params;
        let pool = self.pool.address();
        p.rate_mode.ensure_supported()?;

        // START -> DEPOSITED
        self.approvals
            .approve(
                p.collateral_asset,
                pool,
                p.collateral_amount,
                p.account,
                &mut progress.confirmations,
            )
            .await?;
        self.approvals
            .ensure_allowance(p.collateral_asset, p.account, pool, p.collateral_amount)
            .await?;
        let deposit = self
            .pool
            .deposit(p.collateral_asset, p.collateral_amount, p.account, p.referral_code)
            .await?;
        info!(amount = %p.collateral_amount, tx_hash = %deposit.tx_hash, "collateral deposited");
        progress.record(deposit);
        progress.advance();

        // DEPOSITED -> POSITION_KNOWN
        let initial_position = self.positions.account_position(p.account).await?;
        progress.advance();

        // POSITION_KNOWN -> PRICED
        let price = self.oracle.latest_price(p.price_feed).await?;
        progress.advance();

        // PRICED -> SIZED; a zero size halts here without a borrow.
        let borrowed = compute_borrow_amount(&initial_position, &price, p.safety_factor)?;
        info!(
            available = %initial_position.available_to_borrow,
            rate = %price.rate,
            amount = %borrowed,
            "borrow sized"
        );
        progress.advance();
        if borrowed.is_zero() {
            return Err(BorrowError::NoBorrowCapacity);
        }

        // SIZED -> BORROWED
        let borrow = self
            .pool
            .borrow(p.borrow_asset, borrowed, p.rate_mode, p.referral_code, p.account)
            .await?;
        info!(amount = %borrowed, tx_hash = %borrow.tx_hash, "borrowed");
        progress.record(borrow);
        progress.advance();

        // BORROWED -> REPAID
        let post_borrow_position = self.positions.account_position(p.account).await?;
        self.approvals
            .approve(
                p.borrow_asset,
                pool,
                borrowed,
                p.account,
                &mut progress.confirmations,
            )
            .await?;
        self.approvals
            .ensure_allowance(p.borrow_asset, p.account, pool, borrowed)
            .await?;
        let repay = self
            .pool
            .repay(p.borrow_asset, borrowed, p.rate_mode, p.account)
            .await?;
        info!(amount = %borrowed, tx_hash = %repay.tx_hash, "repaid");
        progress.record(repay);
        progress.advance();

        // REPAID -> DONE
        let final_position = self.positions.account_position(p.account).await?;
        progress.advance();

        Ok(CycleSummary {
            collateral_amount: p.collateral_amount,
            borrowed,
            price,
            initial_position,
            post_borrow_position,
            final_position,
            confirmations: std::mem::take(&mut progress.confirmations),
        })
    }
}
