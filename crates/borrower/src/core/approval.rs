//! Exact, idempotent ERC20 allowances.
//!
//! Grants exactly the requested amount (never an unlimited allowance). If a
//! different non-zero allowance is already in place it is first reset to
//! zero, since some tokens (USDT-style) revert on a non-zero to non-zero
//! change. Each approval is confirmed before the next one is sent.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{info, warn};

use crate::errors::BorrowError;
use crate::execution::Erc20Token;
use crate::types::{Amount, Confirmation};

use super::retry::RetryPolicy;

pub struct ApprovalGate<T: Erc20Token> {
    token: Arc<T>,
    retry: RetryPolicy,
}

impl<T: Erc20Token> ApprovalGate<T> {
    pub fn new(token: Arc<T>, retry: RetryPolicy) -> Self {
        Self { token, retry }
    }

    /// Bring `owner`'s allowance for `spender` on `asset` to exactly `amount`.
    ///
    /// Appends to `sent` the confirmation of each approval as it lands: none
    /// when the allowance already matches, one when it was zero, two (reset,
    /// set) otherwise. A reset stays in `sent` even if the set then fails.
    pub async fn approve(
        &self,
        asset: Address,
        spender: Address,
        amount: Amount,
        owner: Address,
        sent: &mut Vec<Confirmation>,
    ) -> Result<(), BorrowError> {
        if amount.is_zero() {
            return Err(BorrowError::InvalidAmount {
                reason: "approval amount must be positive".into(),
            });
        }
        let signer = self.token.owner();
        if owner != signer {
            return Err(BorrowError::Config(format!(
                "owner {owner} cannot sign approvals (signer is {signer})"
            )));
        }

        let current = self.current_allowance(asset, owner, spender).await?;
        if current == amount {
            info!(asset = %asset, spender = %spender, %amount, "allowance already set");
            return Ok(());
        }

        if !current.is_zero() {
            warn!(
                asset = %asset,
                spender = %spender,
                current = %current,
                target = %amount,
                "resetting existing allowance to zero"
            );
            sent.push(self.token.approve(asset, spender, U256::ZERO).await?);
        }

        let confirmation = self.token.approve(asset, spender, amount).await?;
        info!(
            asset = %asset,
            spender = %spender,
            %amount,
            tx_hash = %confirmation.tx_hash,
            "ERC20 approved"
        );
        sent.push(confirmation);
        Ok(())
    }

    /// Fail with `InsufficientAllowance` unless `required` is covered.
    pub async fn ensure_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
        required: Amount,
    ) -> Result<(), BorrowError> {
        let current = self.current_allowance(asset, owner, spender).await?;
        if current < required {
            return Err(BorrowError::InsufficientAllowance {
                asset: asset.to_string(),
                current: current.to_string(),
                required: required.to_string(),
            });
        }
        Ok(())
    }

    async fn current_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Amount, BorrowError> {
        let token = &self.token;
        self.retry
            .run("allowance", move || token.allowance(asset, owner, spender))
            .await
    }
}
