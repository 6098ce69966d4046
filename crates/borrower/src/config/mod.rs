pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Default config directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// `BORROWER_CONFIG_DIR` if set, else `./config`.
pub fn config_dir_from_env() -> PathBuf {
    env_string("BORROWER_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

/// Load and merge all config JSON files into a single [`BorrowerConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   workflow.json
///   timing.json
///   networks/<network>.json
/// ```
///
/// The network file is chosen by `workflow.network` (after the
/// `BORROWER_NETWORK` override).
///
/// # Environment variable overrides
///
/// | Env Var            | Config Field                 |
/// |--------------------|------------------------------|
/// | `BORROWER_NETWORK` | `workflow.network`           |
/// | `RPC_URL`          | `network.rpc.http_url`       |
/// | `CONFIRMATIONS`    | `workflow.confirmations`     |
/// | `SAFETY_FACTOR`    | `workflow.safety_factor`     |
/// | `DEPOSIT_AMOUNT`   | `workflow.deposit_amount`    |
pub fn load_config(config_dir: &Path) -> Result<BorrowerConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let mut workflow: WorkflowConfig =
        serde_json::from_str(&read("workflow.json")?).context("parsing workflow.json")?;

    let timing: TimingConfig =
        serde_json::from_str(&read("timing.json")?).context("parsing timing.json")?;

    if let Some(val) = env_string("BORROWER_NETWORK") {
        info!(network = %val, "env override: BORROWER_NETWORK");
        workflow.network = val;
    }

    let network_file = format!("networks/{}.json", workflow.network);
    let network: NetworkConfig = serde_json::from_str(&read(&network_file)?)
        .with_context(|| format!("parsing {network_file}"))?;

    let mut config = BorrowerConfig {
        app,
        network,
        workflow,
        timing,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are logged and skipped
/// (the JSON value remains).
fn apply_env_overrides(config: &mut BorrowerConfig) {
    if let Some(val) = env_string("RPC_URL") {
        info!("env override: RPC_URL");
        config.network.rpc.http_url = val;
    }

    if let Some(val) = env_parse::<u64>("CONFIRMATIONS") {
        info!(val, "env override: CONFIRMATIONS");
        config.workflow.confirmations = Some(val);
    }

    if let Some(val) = env_decimal("SAFETY_FACTOR") {
        info!(%val, "env override: SAFETY_FACTOR");
        config.workflow.safety_factor = val;
    }

    if let Some(val) = env_decimal("DEPOSIT_AMOUNT") {
        info!(%val, "env override: DEPOSIT_AMOUNT");
        config.workflow.deposit_amount = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    env_parse::<Decimal>(key)
}
