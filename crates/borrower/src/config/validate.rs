use alloy::primitives::Address;
use anyhow::{bail, Result};
use std::str::FromStr;

use super::types::BorrowerConfig;
use crate::types::units::to_base_units;
use crate::types::{RateMode, SafetyFactor};

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Every problem is collected so a single run reports all of them. Called
/// automatically by [`super::load_config`].
pub fn validate_config(config: &BorrowerConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_network_config(config, &mut errors);
    validate_workflow_config(config, &mut errors);
    validate_timing_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// Network config
// ---------------------------------------------------------------------------

fn validate_network_config(config: &BorrowerConfig, errors: &mut Vec<String>) {
    let network = &config.network;

    if network.chain_id == 0 {
        errors.push("network.chain_id: must be non-zero".into());
    }

    if network.rpc.http_url.is_empty() {
        errors.push("network.rpc: http_url is empty".into());
    }

    if let Err(e) = validate_address(&network.contracts.lending_pool_addresses_provider) {
        errors.push(format!("network.contracts.lending_pool_addresses_provider: {e}"));
    }

    // lending_pool is optional, but if set must be valid.
    if let Some(pool) = &network.contracts.lending_pool {
        if let Err(e) = validate_address(pool) {
            errors.push(format!("network.contracts.lending_pool: {e}"));
        }
    }

    for (symbol, token) in &network.tokens {
        if let Err(e) = validate_address(&token.address) {
            errors.push(format!("network.tokens.{symbol}: {e}"));
        }
    }

    for (name, feed) in &network.price_feeds {
        if let Err(e) = validate_address(&feed.address) {
            errors.push(format!("network.price_feeds.{name}: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow config
// ---------------------------------------------------------------------------

fn validate_workflow_config(config: &BorrowerConfig, errors: &mut Vec<String>) {
    let wf = &config.workflow;

    if let Err(e) = SafetyFactor::from_decimal(wf.safety_factor) {
        errors.push(format!("workflow.safety_factor: {e}"));
    }

    if config.confirmations() == 0 {
        errors.push("workflow.confirmations: must be at least 1".into());
    }

    if wf.rate_mode != RateMode::Variable {
        errors.push(format!(
            "workflow.rate_mode: '{}' is not supported, use 'variable'",
            wf.rate_mode.as_str()
        ));
    }

    if wf.collateral_asset == wf.borrow_asset {
        errors.push(format!(
            "workflow: collateral and borrow asset are both '{}'",
            wf.collateral_asset
        ));
    }

    match config.collateral_token() {
        Ok(token) => {
            if let Err(e) = to_base_units(wf.deposit_amount, token.decimals) {
                errors.push(format!("workflow.deposit_amount: {e}"));
            }
        }
        Err(e) => errors.push(format!("workflow.collateral_asset: {e}")),
    }

    if let Err(e) = config.borrow_token() {
        errors.push(format!("workflow.borrow_asset: {e}"));
    }

    if let Err(e) = config.price_feed() {
        errors.push(format!("workflow.price_feed: {e}"));
    }

    if wf.wrap_native_collateral && wf.collateral_asset != "WETH" {
        errors.push(format!(
            "workflow.wrap_native_collateral: only valid for WETH collateral, got '{}'",
            wf.collateral_asset
        ));
    }
}

// ---------------------------------------------------------------------------
// Timing config
// ---------------------------------------------------------------------------

fn validate_timing_config(config: &BorrowerConfig, errors: &mut Vec<String>) {
    let tx = &config.timing.transaction;
    let retry = &config.timing.rpc_retry;

    if tx.confirmation_timeout_seconds == 0 {
        errors.push("timing.transaction.confirmation_timeout_seconds: must be > 0".into());
    }
    if tx.simulation_timeout_seconds == 0 {
        errors.push("timing.transaction.simulation_timeout_seconds: must be > 0".into());
    }
    if tx.receipt_poll_interval_ms == 0 {
        errors.push("timing.transaction.receipt_poll_interval_ms: must be > 0".into());
    }
    if retry.max_attempts == 0 {
        errors.push("timing.rpc_retry.max_attempts: must be at least 1".into());
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        errors.push(format!(
            "timing.rpc_retry: base_delay_ms ({}) exceeds max_delay_ms ({})",
            retry.base_delay_ms, retry.max_delay_ms
        ));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_address(addr: &str) -> Result<(), String> {
    if addr.is_empty() {
        return Err("address is empty".into());
    }
    let parsed = Address::from_str(addr).map_err(|e| format!("address '{addr}': {e}"))?;
    if parsed == Address::ZERO {
        return Err("address is the zero address".into());
    }
    Ok(())
}
