//! In-memory chain used by the core unit tests.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Mutex;

use alloy::primitives::{Address, B256, I256, U256};
use async_trait::async_trait;

use crate::errors::BorrowError;
use crate::execution::{Erc20Token, LendingPool, PriceFeed};
use crate::types::{AccountPosition, Amount, Confirmation, RateMode, RoundData};

pub const POOL: Address = Address::repeat_byte(0x50);
pub const ACCOUNT: Address = Address::repeat_byte(0xAC);
pub const COLLATERAL: Address = Address::repeat_byte(0xC0);
pub const DEBT_ASSET: Address = Address::repeat_byte(0xDA);
pub const FEED: Address = Address::repeat_byte(0xFE);

/// Recorded chain interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Allowance { asset: Address },
    Approve { asset: Address, amount: Amount },
    Deposit { amount: Amount },
    AccountPosition,
    LatestRound,
    Borrow { amount: Amount },
    Repay { amount: Amount },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Allowance { .. } => "allowance",
            Self::Approve { .. } => "approve",
            Self::Deposit { .. } => "deposit",
            Self::AccountPosition => "account_position",
            Self::LatestRound => "latest_round",
            Self::Borrow { .. } => "borrow",
            Self::Repay { .. } => "repay",
        }
    }
}

struct FailRule {
    call: &'static str,
    occurrences: Range<usize>,
    error: fn() -> BorrowError,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    allowances: HashMap<(Address, Address), Amount>,
    position: Option<AccountPosition>,
    rules: Vec<FailRule>,
}

/// Fake token + pool + feed sharing one call log.
pub struct FakeChain {
    owner: Address,
    available_after_deposit: Amount,
    rate: I256,
    feed_decimals: u8,
    updated_at: u64,
    state: Mutex<State>,
}

impl FakeChain {
    pub fn new(owner: Address, available_after_deposit: u64, rate: i64) -> Self {
        Self {
            owner,
            available_after_deposit: U256::from(available_after_deposit),
            rate: I256::try_from(rate).unwrap(),
            feed_decimals: 0,
            updated_at: chrono::Utc::now().timestamp() as u64,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_updated_at(mut self, updated_at: u64) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn with_allowance(self, asset: Address, spender: Address, amount: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((asset, spender), U256::from(amount));
        self
    }

    /// Fail every `call` whose per-name index falls in `occurrences`.
    pub fn fail(
        self,
        call: &'static str,
        occurrences: Range<usize>,
        error: fn() -> BorrowError,
    ) -> Self {
        self.state.lock().unwrap().rules.push(FailRule {
            call,
            occurrences,
            error,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.name() == name).count()
    }

    pub fn approvals(&self) -> Vec<(Address, Amount)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Approve { asset, amount } => Some((asset, amount)),
                _ => None,
            })
            .collect()
    }

    /// Log the call, then apply any matching failure rule.
    fn record(&self, call: Call) -> Result<(), BorrowError> {
        let mut state = self.state.lock().unwrap();
        let name = call.name();
        let index = state.calls.iter().filter(|c| c.name() == name).count();
        state.calls.push(call);
        for rule in &state.rules {
            if rule.call == name && rule.occurrences.contains(&index) {
                return Err((rule.error)());
            }
        }
        Ok(())
    }

    fn confirmation(&self) -> Confirmation {
        let n = self.state.lock().unwrap().calls.len() as u64;
        Confirmation {
            tx_hash: B256::with_last_byte(n as u8),
            block_number: n,
            confirmations: 1,
            gas_used: 21_000,
        }
    }

    fn ensure_allowance(&self, asset: Address, amount: Amount) -> Result<(), BorrowError> {
        let state = self.state.lock().unwrap();
        let current = state
            .allowances
            .get(&(asset, POOL))
            .copied()
            .unwrap_or_default();
        if current < amount {
            return Err(BorrowError::TransactionRejected {
                reason: "ERC20: transfer amount exceeds allowance".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Erc20Token for FakeChain {
    fn owner(&self) -> Address {
        self.owner
    }

    async fn allowance(
        &self,
        asset: Address,
        _owner: Address,
        spender: Address,
    ) -> Result<Amount, BorrowError> {
        self.record(Call::Allowance { asset })?;
        let state = self.state.lock().unwrap();
        Ok(state
            .allowances
            .get(&(asset, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn approve(
        &self,
        asset: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Confirmation, BorrowError> {
        self.record(Call::Approve { asset, amount })?;
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((asset, spender), amount);
        Ok(self.confirmation())
    }
}

#[async_trait]
impl LendingPool for FakeChain {
    fn address(&self) -> Address {
        POOL
    }

    async fn account_position(&self, _account: Address) -> Result<AccountPosition, BorrowError> {
        self.record(Call::AccountPosition)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .position
            .clone()
            .unwrap_or_else(|| AccountPosition::new(U256::ZERO, U256::ZERO, U256::ZERO)))
    }

    async fn deposit(
        &self,
        asset: Address,
        amount: Amount,
        _on_behalf_of: Address,
        _referral_code: u16,
    ) -> Result<Confirmation, BorrowError> {
        self.record(Call::Deposit { amount })?;
        self.ensure_allowance(asset, amount)?;
        self.state.lock().unwrap().position = Some(AccountPosition::new(
            amount,
            U256::ZERO,
            self.available_after_deposit,
        ));
        Ok(self.confirmation())
    }

    async fn borrow(
        &self,
        _asset: Address,
        amount: Amount,
        rate_mode: RateMode,
        _referral_code: u16,
        _on_behalf_of: Address,
    ) -> Result<Confirmation, BorrowError> {
        rate_mode.ensure_supported()?;
        self.record(Call::Borrow { amount })?;
        let mut state = self.state.lock().unwrap();
        if let Some(position) = state.position.as_mut() {
            position.total_debt += amount;
            position.available_to_borrow = position.available_to_borrow.saturating_sub(amount);
        }
        drop(state);
        Ok(self.confirmation())
    }

    async fn repay(
        &self,
        asset: Address,
        amount: Amount,
        rate_mode: RateMode,
        _on_behalf_of: Address,
    ) -> Result<Confirmation, BorrowError> {
        rate_mode.ensure_supported()?;
        self.record(Call::Repay { amount })?;
        self.ensure_allowance(asset, amount)?;
        let mut state = self.state.lock().unwrap();
        if let Some(position) = state.position.as_mut() {
            position.total_debt = position.total_debt.saturating_sub(amount);
        }
        drop(state);
        Ok(self.confirmation())
    }
}

#[async_trait]
impl PriceFeed for FakeChain {
    async fn latest_round(&self, _feed: Address) -> Result<RoundData, BorrowError> {
        self.record(Call::LatestRound)?;
        Ok(RoundData {
            round_id: 7,
            answer: self.rate,
            updated_at: self.updated_at,
            answered_in_round: 7,
            decimals: self.feed_decimals,
        })
    }
}

// ---------------------------------------------------------------------------
// Error constructors for failure injection
// ---------------------------------------------------------------------------

pub fn rejected() -> BorrowError {
    BorrowError::TransactionRejected {
        reason: "insufficient funds for gas".into(),
    }
}

pub fn timeout() -> BorrowError {
    BorrowError::ConfirmationTimeout {
        tx_hash: B256::ZERO.to_string(),
        timeout_seconds: 60,
    }
}

pub fn position_down() -> BorrowError {
    BorrowError::PositionUnavailable {
        reason: "connection refused".into(),
    }
}

pub fn oracle_down() -> BorrowError {
    BorrowError::OracleUnavailable {
        reason: "connection refused".into(),
    }
}

pub fn rpc_down() -> BorrowError {
    BorrowError::RpcUnavailable {
        operation: "allowance".into(),
        reason: "connection refused".into(),
    }
}
