//! Async seams between the workflow logic and the chain.
//!
//! Production implementations live next to this module (`TokenClient`,
//! `AaveClient`, `ChainlinkFeed`); tests substitute in-memory fakes.

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::errors::BorrowError;
use crate::types::{AccountPosition, Amount, Confirmation, RateMode, RoundData};

/// ERC20 allowance surface.
#[async_trait]
pub trait Erc20Token: Send + Sync {
    /// Account whose key signs approvals submitted through this handle.
    fn owner(&self) -> Address;

    async fn allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Amount, BorrowError>;

    /// Submit `approve(spender, amount)` and wait for confirmation.
    async fn approve(
        &self,
        asset: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Confirmation, BorrowError>;
}

/// A single resolved lending pool.
#[async_trait]
pub trait LendingPool: Send + Sync {
    /// Pool address, the spender every allowance is granted to.
    fn address(&self) -> Address;

    async fn account_position(&self, account: Address) -> Result<AccountPosition, BorrowError>;

    async fn deposit(
        &self,
        asset: Address,
        amount: Amount,
        on_behalf_of: Address,
        referral_code: u16,
    ) -> Result<Confirmation, BorrowError>;

    async fn borrow(
        &self,
        asset: Address,
        amount: Amount,
        rate_mode: RateMode,
        referral_code: u16,
        on_behalf_of: Address,
    ) -> Result<Confirmation, BorrowError>;

    async fn repay(
        &self,
        asset: Address,
        amount: Amount,
        rate_mode: RateMode,
        on_behalf_of: Address,
    ) -> Result<Confirmation, BorrowError>;
}

/// Read-only price feed.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn latest_round(&self, feed: Address) -> Result<RoundData, BorrowError>;
}
