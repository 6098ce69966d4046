use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MAX_PRICE_AGE_SECONDS, DEFAULT_REFERRAL_CODE, DEFAULT_SAFETY_FACTOR, REFERENCE_DECIMALS,
};
use crate::errors::BorrowError;
use crate::types::{RateMode, SafetyFactor};

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BorrowerConfig {
    pub app: AppConfig,
    pub network: NetworkConfig,
    pub workflow: WorkflowConfig,
    pub timing: TimingConfig,
}

impl BorrowerConfig {
    /// Confirmation depth: explicit workflow value, else the network default.
    pub fn confirmations(&self) -> u64 {
        self.workflow
            .confirmations
            .unwrap_or(self.network.block_confirmations)
    }

    /// Staleness bound for oracle rounds; `0` disables the check.
    pub fn max_price_age(&self) -> Option<u64> {
        match self.workflow.max_price_age_seconds {
            0 => None,
            secs => Some(secs),
        }
    }

    pub fn safety_factor(&self) -> Result<SafetyFactor, BorrowError> {
        SafetyFactor::from_decimal(self.workflow.safety_factor)
    }

    pub fn token(&self, symbol: &str) -> Result<&TokenConfig, BorrowError> {
        self.network.tokens.get(symbol).ok_or_else(|| {
            BorrowError::Config(format!(
                "token '{symbol}' not listed for network '{}'",
                self.workflow.network
            ))
        })
    }

    pub fn collateral_token(&self) -> Result<&TokenConfig, BorrowError> {
        self.token(&self.workflow.collateral_asset)
    }

    pub fn borrow_token(&self) -> Result<&TokenConfig, BorrowError> {
        self.token(&self.workflow.borrow_asset)
    }

    pub fn price_feed(&self) -> Result<&PriceFeedConfig, BorrowError> {
        let name = &self.workflow.price_feed;
        self.network.price_feeds.get(name).ok_or_else(|| {
            BorrowError::Config(format!(
                "price feed '{name}' not listed for network '{}'",
                self.workflow.network
            ))
        })
    }
}

/// Parse a configured `0x` address, naming the field on failure.
pub fn parse_address(field: &str, value: &str) -> Result<Address, BorrowError> {
    Address::from_str(value)
        .map_err(|e| BorrowError::Config(format!("{field}: invalid address '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
}

// ---------------------------------------------------------------------------
// networks/<name>.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    #[serde(default = "default_block_confirmations")]
    pub block_confirmations: u64,
    /// Decimals of the currency `getUserAccountData` reports in (ETH on V2).
    #[serde(default = "default_reference_decimals")]
    pub reference_decimals: u8,
    pub rpc: RpcConfig,
    pub contracts: ContractsConfig,
    pub tokens: HashMap<String, TokenConfig>,
    pub price_feeds: HashMap<String, PriceFeedConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub http_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub lending_pool_addresses_provider: String,
    /// Pins the pool and skips resolution through the addresses provider.
    #[serde(default)]
    pub lending_pool: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeedConfig {
    pub address: String,
}

fn default_block_confirmations() -> u64 {
    1
}

fn default_reference_decimals() -> u8 {
    REFERENCE_DECIMALS
}

// ---------------------------------------------------------------------------
// workflow.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub network: String,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default = "default_safety_factor")]
    pub safety_factor: Decimal,
    /// Token symbol, looked up in the network's `tokens`.
    pub collateral_asset: String,
    pub borrow_asset: String,
    /// Feed name, looked up in the network's `price_feeds`.
    pub price_feed: String,
    /// Whole collateral units, e.g. `"0.02"`.
    pub deposit_amount: Decimal,
    #[serde(default = "default_rate_mode")]
    pub rate_mode: RateMode,
    #[serde(default = "default_referral_code")]
    pub referral_code: u16,
    #[serde(default = "default_max_price_age")]
    pub max_price_age_seconds: u64,
    #[serde(default)]
    pub wrap_native_collateral: bool,
}

fn default_safety_factor() -> Decimal {
    DEFAULT_SAFETY_FACTOR
}

fn default_rate_mode() -> RateMode {
    RateMode::Variable
}

fn default_referral_code() -> u16 {
    DEFAULT_REFERRAL_CODE
}

fn default_max_price_age() -> u64 {
    DEFAULT_MAX_PRICE_AGE_SECONDS
}

// ---------------------------------------------------------------------------
// timing.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    pub transaction: TransactionTiming,
    pub rpc_retry: RpcRetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionTiming {
    pub confirmation_timeout_seconds: u64,
    pub simulation_timeout_seconds: u64,
    #[serde(default = "default_receipt_poll_interval")]
    pub receipt_poll_interval_ms: u64,
}

fn default_receipt_poll_interval() -> u64 {
    1_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}
