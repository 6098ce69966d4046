use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use aave_borrower::config::{self, parse_address, BorrowerConfig};
use aave_borrower::core::orchestrator::{BorrowWorkflow, CycleParams, WorkflowSettings};
use aave_borrower::core::retry::RetryPolicy;
use aave_borrower::execution::aave_client::AaveClient;
use aave_borrower::execution::price_feed::ChainlinkFeed;
use aave_borrower::execution::token_client::TokenClient;
use aave_borrower::execution::tx_submitter::{HttpProvider, TxSubmitter};
use aave_borrower::logging;
use aave_borrower::types::units::{to_base_units, to_display_units};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = config::config_dir_from_env();
    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        network = %config.workflow.network,
        chain_id = config.network.chain_id,
        confirmations = config.confirmations(),
        safety_factor = %config.workflow.safety_factor,
        "aave borrower starting"
    );

    let signer = init_signer()?;
    let account = signer.address();

    // -----------------------------------------------------------------------
    // Provider
    // -----------------------------------------------------------------------

    let rpc_url: Url = config
        .network
        .rpc
        .http_url
        .parse()
        .context("failed to parse RPC URL")?;
    let provider = RootProvider::new_http(rpc_url);

    let chain_id = provider
        .get_chain_id()
        .await
        .context("failed to query chain id")?;
    if chain_id != config.network.chain_id {
        anyhow::bail!(
            "RPC endpoint reports chain {chain_id}, network '{}' expects {}",
            config.workflow.network,
            config.network.chain_id
        );
    }

    // -----------------------------------------------------------------------
    // Component construction (dependency injection order)
    // -----------------------------------------------------------------------

    let submitter = Arc::new(TxSubmitter::new(
        provider.clone(),
        signer,
        &config.timing.transaction,
        chain_id,
        config.confirmations(),
    ));

    let pool_address = resolve_pool(&provider, &config).await?;
    let pool = Arc::new(AaveClient::new(provider.clone(), pool_address, submitter.clone()));
    let token = Arc::new(TokenClient::new(provider.clone(), submitter.clone()));
    let feed = Arc::new(ChainlinkFeed::new(provider.clone()));

    let collateral = config.collateral_token()?;
    let borrow = config.borrow_token()?;
    let collateral_asset = parse_address("collateral token", &collateral.address)?;
    let collateral_amount = to_base_units(config.workflow.deposit_amount, collateral.decimals)?;

    if config.workflow.wrap_native_collateral {
        wrap_shortfall(&token, collateral_asset, account, collateral_amount, collateral.decimals)
            .await?;
    }

    let params = CycleParams {
        account,
        collateral_asset,
        collateral_amount,
        borrow_asset: parse_address("borrow token", &borrow.address)?,
        price_feed: parse_address("price feed", &config.price_feed()?.address)?,
        safety_factor: config.safety_factor()?,
        rate_mode: config.workflow.rate_mode,
        referral_code: config.workflow.referral_code,
    };
    let settings = WorkflowSettings {
        retry: RetryPolicy::from_config(&config.timing.rpc_retry),
        max_price_age: config.max_price_age(),
        borrow_decimals: borrow.decimals,
        reference_decimals: config.network.reference_decimals,
    };

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------

    let workflow = BorrowWorkflow::new(token, pool, feed, settings, params);
    let report = workflow.run().await;

    let trail: Vec<&str> = report.trail.iter().map(|s| s.as_str()).collect();
    match &report.outcome {
        Ok(summary) => {
            info!(
                trail = %trail.join(" -> "),
                borrowed = %to_display_units(summary.borrowed, borrow.decimals),
                asset = %config.workflow.borrow_asset,
                transactions = summary.confirmations.len(),
                final_collateral = %summary.final_position.total_collateral,
                final_debt = %summary.final_position.total_debt,
                "cycle finished"
            );
            Ok(())
        }
        Err(failure) => {
            error!(
                trail = %trail.join(" -> "),
                last_state = %failure.last_state,
                reason = ?failure.kind,
                confirmed_transactions = failure.confirmations.len(),
                error = %failure.error,
                "cycle halted, on-chain state up to the last state is confirmed"
            );
            Err(anyhow::anyhow!("{failure}"))
        }
    }
}

/// Signer from `PRIVATE_KEY` (with or without `0x`).
fn init_signer() -> Result<PrivateKeySigner> {
    let key = std::env::var("PRIVATE_KEY")
        .ok()
        .filter(|v| !v.is_empty())
        .context("PRIVATE_KEY is required")?;
    let key = key.strip_prefix("0x").unwrap_or(&key);
    let signer = key
        .parse::<PrivateKeySigner>()
        .context("failed to parse PRIVATE_KEY")?;
    info!(account = %signer.address(), "signer loaded");
    Ok(signer)
}

/// Pinned `lending_pool`, else resolved through the addresses provider.
async fn resolve_pool(provider: &HttpProvider, config: &BorrowerConfig) -> Result<Address> {
    let contracts = &config.network.contracts;
    if let Some(pool) = &contracts.lending_pool {
        let pool = parse_address("lending_pool", pool)?;
        info!(pool = %pool, "using pinned lending pool");
        return Ok(pool);
    }
    let addresses_provider = parse_address(
        "lending_pool_addresses_provider",
        &contracts.lending_pool_addresses_provider,
    )?;
    AaveClient::resolve_pool(provider, addresses_provider)
        .await
        .context("failed to resolve lending pool")
}

/// Wrap only as much native ether as the WETH balance is short of `amount`.
async fn wrap_shortfall(
    token: &TokenClient,
    weth: Address,
    account: Address,
    amount: U256,
    decimals: u8,
) -> Result<()> {
    let balance = token.balance_of(weth, account).await?;
    if balance >= amount {
        info!(balance = %to_display_units(balance, decimals), "WETH balance covers deposit");
        return Ok(());
    }
    let shortfall = amount - balance;
    warn!(
        shortfall = %to_display_units(shortfall, decimals),
        "wrapping native ether for collateral"
    );
    token.wrap_native(weth, shortfall).await?;
    Ok(())
}
