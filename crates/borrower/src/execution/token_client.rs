//! ERC20 client: allowance reads, approvals and WETH wrapping.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::BorrowError;
use crate::types::{Amount, Confirmation};

use super::contracts::{IERC20, IWETH};
use super::traits::Erc20Token;
use super::tx_submitter::{HttpProvider, TxSubmitter};

/// ERC20 reads go through the shared provider; writes through the submitter.
pub struct TokenClient {
    provider: HttpProvider,
    submitter: Arc<TxSubmitter>,
}

impl TokenClient {
    pub fn new(provider: HttpProvider, submitter: Arc<TxSubmitter>) -> Self {
        Self {
            provider,
            submitter,
        }
    }

    pub async fn balance_of(&self, asset: Address, owner: Address) -> Result<Amount, BorrowError> {
        IERC20::new(asset, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| BorrowError::RpcUnavailable {
                operation: "balanceOf".into(),
                reason: e.to_string(),
            })
    }

    /// Wrap `amount` of native ether into WETH at `weth`.
    pub async fn wrap_native(
        &self,
        weth: Address,
        amount: Amount,
    ) -> Result<Confirmation, BorrowError> {
        if amount.is_zero() {
            return Err(BorrowError::InvalidAmount {
                reason: "wrap amount must be positive".into(),
            });
        }
        let mut tx = self.submitter.call_request(weth, Self::encode_wrap());
        tx.set_value(amount);

        let confirmation = self.submitter.submit_and_confirm(tx).await?;
        info!(
            weth = %weth,
            amount = %amount,
            tx_hash = %confirmation.tx_hash,
            "native ether wrapped"
        );
        Ok(confirmation)
    }

    /// Encode calldata for `IERC20.approve()`.
    pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
        Bytes::from(IERC20::approveCall { spender, amount }.abi_encode())
    }

    /// Encode calldata for `IWETH.deposit()`.
    pub fn encode_wrap() -> Bytes {
        Bytes::from(IWETH::depositCall {}.abi_encode())
    }
}

#[async_trait]
impl Erc20Token for TokenClient {
    fn owner(&self) -> Address {
        self.submitter.signer_address()
    }

    async fn allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Amount, BorrowError> {
        let current = IERC20::new(asset, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| BorrowError::RpcUnavailable {
                operation: "allowance".into(),
                reason: e.to_string(),
            })?;
        debug!(
            asset = %asset,
            owner = %owner,
            spender = %spender,
            allowance = %current,
            "allowance"
        );
        Ok(current)
    }

    async fn approve(
        &self,
        asset: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Confirmation, BorrowError> {
        let tx = self
            .submitter
            .call_request(asset, Self::encode_approve(spender, amount));
        self.submitter.submit_and_confirm(tx).await
    }
}
