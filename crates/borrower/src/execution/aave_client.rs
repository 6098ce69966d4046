//! Aave V2 LendingPool client: typed reads, calldata encoding and
//! confirmed deposit / borrow / repay submissions.
//!
//! Allowances are not managed here: callers approve the pool first (see
//! `core::approval`). Every mutating call returns only once the configured
//! confirmation depth is reached.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::BorrowError;
use crate::types::{AccountPosition, Amount, Confirmation, RateMode};

use super::contracts::{ILendingPool, ILendingPoolAddressesProvider};
use super::traits::LendingPool;
use super::tx_submitter::{HttpProvider, TxSubmitter};

/// Handle on one resolved LendingPool proxy.
pub struct AaveClient {
    pool: ILendingPool::ILendingPoolInstance<HttpProvider>,
    submitter: Arc<TxSubmitter>,
}

impl AaveClient {
    pub fn new(provider: HttpProvider, pool_address: Address, submitter: Arc<TxSubmitter>) -> Self {
        Self {
            pool: ILendingPool::new(pool_address, provider),
            submitter,
        }
    }

    /// Resolve the current LendingPool proxy from the market's addresses provider.
    pub async fn resolve_pool(
        provider: &HttpProvider,
        addresses_provider: Address,
    ) -> Result<Address, BorrowError> {
        let pool = ILendingPoolAddressesProvider::new(addresses_provider, provider.clone())
            .getLendingPool()
            .call()
            .await
            .map_err(|e| BorrowError::RpcUnavailable {
                operation: "getLendingPool".into(),
                reason: e.to_string(),
            })?;

        if pool == Address::ZERO {
            return Err(BorrowError::Config(format!(
                "addresses provider {addresses_provider} returned no lending pool"
            )));
        }
        info!(addresses_provider = %addresses_provider, pool = %pool, "lending pool resolved");
        Ok(pool)
    }

    // -----------------------------------------------------------------------
    // Encode operations (sync, local ABI encoding, no RPC)
    // -----------------------------------------------------------------------

    /// Encode calldata for `LendingPool.deposit()`.
    pub fn encode_deposit(
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
        referral_code: u16,
    ) -> Bytes {
        let call = ILendingPool::depositCall {
            asset,
            amount,
            onBehalfOf: on_behalf_of,
            referralCode: referral_code,
        };
        Bytes::from(call.abi_encode())
    }

    /// Encode calldata for `LendingPool.borrow()`. Refuses the stable mode.
    pub fn encode_borrow(
        asset: Address,
        amount: U256,
        rate_mode: RateMode,
        referral_code: u16,
        on_behalf_of: Address,
    ) -> Result<Bytes, BorrowError> {
        let mode = rate_mode.ensure_supported()?;
        let call = ILendingPool::borrowCall {
            asset,
            amount,
            interestRateMode: U256::from(mode.code()),
            referralCode: referral_code,
            onBehalfOf: on_behalf_of,
        };
        Ok(Bytes::from(call.abi_encode()))
    }

    /// Encode calldata for `LendingPool.repay()`. Refuses the stable mode.
    pub fn encode_repay(
        asset: Address,
        amount: U256,
        rate_mode: RateMode,
        on_behalf_of: Address,
    ) -> Result<Bytes, BorrowError> {
        let mode = rate_mode.ensure_supported()?;
        let call = ILendingPool::repayCall {
            asset,
            amount,
            rateMode: U256::from(mode.code()),
            onBehalfOf: on_behalf_of,
        };
        Ok(Bytes::from(call.abi_encode()))
    }

    async fn submit(&self, calldata: Bytes) -> Result<Confirmation, BorrowError> {
        let tx = self.submitter.call_request(*self.pool.address(), calldata);
        self.submitter.submit_and_confirm(tx).await
    }
}

fn ensure_positive(amount: Amount, operation: &str) -> Result<(), BorrowError> {
    if amount.is_zero() {
        return Err(BorrowError::InvalidAmount {
            reason: format!("{operation} amount must be positive"),
        });
    }
    Ok(())
}

#[async_trait]
impl LendingPool for AaveClient {
    fn address(&self) -> Address {
        *self.pool.address()
    }

    /// Query the pool for a user's aggregate position (ETH wei figures).
    async fn account_position(&self, account: Address) -> Result<AccountPosition, BorrowError> {
        let result = self
            .pool
            .getUserAccountData(account)
            .call()
            .await
            .map_err(|e| BorrowError::PositionUnavailable {
                reason: format!("getUserAccountData failed: {e}"),
            })?;

        let position = AccountPosition {
            total_collateral: result.totalCollateralETH,
            total_debt: result.totalDebtETH,
            available_to_borrow: result.availableBorrowsETH,
            current_liquidation_threshold: result.currentLiquidationThreshold,
            ltv: result.ltv,
            health_factor: result.healthFactor,
        };

        debug!(
            account = %account,
            collateral = %position.total_collateral,
            debt = %position.total_debt,
            available = %position.available_to_borrow,
            "account position"
        );

        Ok(position)
    }

    async fn deposit(
        &self,
        asset: Address,
        amount: Amount,
        on_behalf_of: Address,
        referral_code: u16,
    ) -> Result<Confirmation, BorrowError> {
        ensure_positive(amount, "deposit")?;
        self.submit(Self::encode_deposit(asset, amount, on_behalf_of, referral_code))
            .await
    }

    async fn borrow(
        &self,
        asset: Address,
        amount: Amount,
        rate_mode: RateMode,
        referral_code: u16,
        on_behalf_of: Address,
    ) -> Result<Confirmation, BorrowError> {
        ensure_positive(amount, "borrow")?;
        let calldata = Self::encode_borrow(asset, amount, rate_mode, referral_code, on_behalf_of)?;
        self.submit(calldata).await
    }

    async fn repay(
        &self,
        asset: Address,
        amount: Amount,
        rate_mode: RateMode,
        on_behalf_of: Address,
    ) -> Result<Confirmation, BorrowError> {
        ensure_positive(amount, "repay")?;
        let calldata = Self::encode_repay(asset, amount, rate_mode, on_behalf_of)?;
        self.submit(calldata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const USER: Address = address!("0000000000000000000000000000000000000001");

    #[test]
    fn test_encode_deposit_selector() {
        let data = AaveClient::encode_deposit(WETH, U256::from(10u64.pow(16)), USER, 0);
        // LendingPool.deposit(address,uint256,address,uint16) selector = 0xe8eda9df
        assert_eq!(&data[..4], &[0xe8, 0xed, 0xa9, 0xdf]);
    }

    #[test]
    fn test_encode_borrow_selector() {
        let data =
            AaveClient::encode_borrow(DAI, U256::from(2u64), RateMode::Variable, 0, USER).unwrap();
        // LendingPool.borrow(address,uint256,uint256,uint16,address) selector = 0xa415bcad
        assert_eq!(&data[..4], &[0xa4, 0x15, 0xbc, 0xad]);
    }

    #[test]
    fn test_encode_repay_selector() {
        let data =
            AaveClient::encode_repay(DAI, U256::from(2u64), RateMode::Variable, USER).unwrap();
        // LendingPool.repay(address,uint256,uint256,address) selector = 0x573ade81
        assert_eq!(&data[..4], &[0x57, 0x3a, 0xde, 0x81]);
    }

    #[test]
    fn test_encode_borrow_variable_mode() {
        let amount = U256::from(1_900_000_000_000_000_000_000u128);
        let data = AaveClient::encode_borrow(DAI, amount, RateMode::Variable, 0, USER).unwrap();
        let decoded = ILendingPool::borrowCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.asset, DAI);
        assert_eq!(decoded.amount, amount);
        assert_eq!(decoded.interestRateMode, U256::from(2u64));
        assert_eq!(decoded.referralCode, 0);
        assert_eq!(decoded.onBehalfOf, USER);
    }

    #[test]
    fn test_stable_mode_refused_before_encoding() {
        let err = AaveClient::encode_borrow(DAI, U256::from(1u64), RateMode::Stable, 0, USER)
            .unwrap_err();
        assert!(matches!(err, BorrowError::UnsupportedRateMode { mode: 1 }));

        let err =
            AaveClient::encode_repay(DAI, U256::from(1u64), RateMode::Stable, USER).unwrap_err();
        assert!(matches!(err, BorrowError::UnsupportedRateMode { mode: 1 }));
    }

    #[test]
    fn test_zero_amount_refused() {
        assert!(matches!(
            ensure_positive(U256::ZERO, "borrow"),
            Err(BorrowError::InvalidAmount { .. })
        ));
        assert!(ensure_positive(U256::from(1u64), "borrow").is_ok());
    }
}
