//! Transaction submitter: signing, simulation, submission and confirmation.
//!
//! Signs legacy (EIP-155) transactions locally, simulates them via
//! `eth_call` before submission, and waits for a configurable confirmation
//! depth. A submitted transaction is never resubmitted from here: timeouts
//! surface as `ConfirmationTimeout` and the caller decides.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::decode_revert_reason;
use alloy::transports::TransportError;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::TransactionTiming;
use crate::constants::GAS_PRICE_BUFFER_PCT;
use crate::errors::BorrowError;
use crate::types::{Confirmation, PendingTx};

/// Concrete provider type: Alloy HTTP provider over Ethereum network.
pub type HttpProvider = RootProvider;

// ---------------------------------------------------------------------------
// TxSubmitter
// ---------------------------------------------------------------------------

/// Transaction submitter with local signing and nonce management.
pub struct TxSubmitter {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    /// Async-safe nonce counter. `None` until first chain query.
    nonce: Mutex<Option<u64>>,
    simulation_timeout: Duration,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    required_confirmations: u64,
    chain_id: u64,
}

impl TxSubmitter {
    pub fn new(
        provider: HttpProvider,
        signer: PrivateKeySigner,
        timing: &TransactionTiming,
        chain_id: u64,
        required_confirmations: u64,
    ) -> Self {
        info!(
            address = %signer.address(),
            chain_id,
            required_confirmations,
            confirmation_timeout = timing.confirmation_timeout_seconds,
            "TxSubmitter initialized"
        );

        Self {
            provider,
            signer,
            nonce: Mutex::new(None),
            simulation_timeout: Duration::from_secs(timing.simulation_timeout_seconds),
            confirmation_timeout: Duration::from_secs(timing.confirmation_timeout_seconds),
            poll_interval: Duration::from_millis(timing.receipt_poll_interval_ms),
            required_confirmations,
            chain_id,
        }
    }

    /// Returns the address associated with the signer.
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Contract call request from the signer with the given calldata.
    pub fn call_request(&self, to: Address, input: Bytes) -> TransactionRequest {
        let mut tx = TransactionRequest::default();
        tx.set_from(self.signer.address());
        tx.set_to(to);
        tx.set_value(U256::ZERO);
        tx.set_input(input);
        tx
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Simulate a transaction via `eth_call` with timeout protection.
    ///
    /// A revert here means the chain would refuse the transaction, so it is
    /// reported as `TransactionRejected` with the decoded reason.
    pub async fn simulate(&self, tx: &TransactionRequest) -> Result<Bytes, BorrowError> {
        let provider = &self.provider;
        let tx_clone = tx.clone();
        match tokio::time::timeout(self.simulation_timeout, async move {
            provider.call(tx_clone).await
        })
        .await
        {
            Ok(Ok(result)) => {
                debug!(output_len = result.len(), "simulation succeeded");
                Ok(result)
            }
            Ok(Err(e)) => Err(BorrowError::TransactionRejected {
                reason: format!("simulation reverted: {}", rejection_reason(&e)),
            }),
            Err(_) => Err(BorrowError::TransactionRejected {
                reason: format!(
                    "simulation timed out after {}s",
                    self.simulation_timeout.as_secs()
                ),
            }),
        }
    }

    /// Full flow: simulate → submit → wait for the configured depth.
    pub async fn submit_and_confirm(
        &self,
        tx: TransactionRequest,
    ) -> Result<Confirmation, BorrowError> {
        self.simulate(&tx).await?;
        let pending = self.submit(tx).await?;
        self.wait_for_confirmations(pending).await
    }

    /// Sign and submit a transaction. Assigns nonce, gas price and gas limit.
    pub async fn submit(&self, tx: TransactionRequest) -> Result<PendingTx, BorrowError> {
        let nonce = self.get_next_nonce().await?;
        let gas_price = self.get_gas_price().await?;

        let gas_limit: u64 = match tx.gas {
            Some(gas) => gas,
            None => match self.provider.estimate_gas(tx.clone()).await {
                Ok(estimate) => estimate,
                Err(e) => {
                    self.release_nonce().await;
                    return Err(BorrowError::TransactionRejected {
                        reason: format!("gas estimation failed: {}", rejection_reason(&e)),
                    });
                }
            },
        };

        let to = tx.to.unwrap_or(TxKind::Create);
        let value = tx.value.unwrap_or_default();
        let input = tx.input.into_input().unwrap_or_default();

        let tx_hash = match self
            .sign_and_send(nonce, gas_price, gas_limit, to, value, input)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                self.release_nonce().await;
                return Err(e);
            }
        };

        info!(
            tx_hash = %tx_hash,
            nonce,
            gas_price,
            gas_limit,
            "transaction submitted"
        );

        Ok(PendingTx {
            tx_hash,
            required_confirmations: self.required_confirmations,
        })
    }

    /// Poll until the receipt is buried `required_confirmations` deep.
    ///
    /// Returns `TransactionRejected` if the receipt has `status == 0` and
    /// `ConfirmationTimeout` once the bound elapses.
    pub async fn wait_for_confirmations(
        &self,
        pending: PendingTx,
    ) -> Result<Confirmation, BorrowError> {
        let start = tokio::time::Instant::now();
        let tx_hash = pending.tx_hash;

        loop {
            // A hung RPC call must not outlive the overall bound.
            let remaining = self.confirmation_timeout.saturating_sub(start.elapsed());
            let polled = tokio::time::timeout(remaining, self.poll_confirmation(tx_hash)).await;
            match polled.unwrap_or(Ok(None)) {
                Ok(Some((block_number, gas_used, head))) => {
                    let depth = confirmation_depth(block_number, head);
                    if depth >= pending.required_confirmations {
                        info!(
                            tx_hash = %tx_hash,
                            block_number,
                            confirmations = depth,
                            gas_used,
                            "transaction confirmed"
                        );
                        return Ok(Confirmation {
                            tx_hash,
                            block_number,
                            confirmations: depth,
                            gas_used,
                        });
                    }
                    debug!(tx_hash = %tx_hash, depth, "awaiting confirmations");
                }
                Ok(None) => {}
                Err(e @ BorrowError::TransactionRejected { .. }) => return Err(e),
                Err(e) => {
                    warn!(error = %e, tx_hash = %tx_hash, "receipt poll error, retrying");
                }
            }

            if start.elapsed() >= self.confirmation_timeout {
                return Err(BorrowError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    timeout_seconds: self.confirmation_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Current gas price in wei with the safety buffer applied.
    pub async fn get_gas_price(&self) -> Result<u128, BorrowError> {
        let base_price = self.provider.get_gas_price().await.map_err(|e| {
            BorrowError::RpcUnavailable {
                operation: "eth_gasPrice".into(),
                reason: e.to_string(),
            }
        })?;
        Ok(buffered_gas_price(base_price))
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// `(receipt_block, gas_used, head_block)` once mined, `None` before.
    async fn poll_confirmation(
        &self,
        tx_hash: B256,
    ) -> Result<Option<(u64, u64, u64)>, BorrowError> {
        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(None);
        };

        if !receipt.status() {
            return Err(BorrowError::TransactionRejected {
                reason: format!("transaction {tx_hash} reverted on-chain"),
            });
        }

        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };
        let head = self.provider.get_block_number().await?;
        Ok(Some((block_number, receipt.gas_used, head)))
    }

    /// Get the next nonce, initialising from chain on the first call.
    async fn get_next_nonce(&self) -> Result<u64, BorrowError> {
        let mut guard = self.nonce.lock().await;
        let nonce = match *guard {
            Some(n) => n,
            None => {
                let n = self
                    .provider
                    .get_transaction_count(self.signer.address())
                    .await?;
                info!(nonce = n, "nonce initialized from chain");
                n
            }
        };
        *guard = Some(nonce + 1);
        Ok(nonce)
    }

    /// Forget the local nonce so the next submission re-reads it.
    async fn release_nonce(&self) {
        *self.nonce.lock().await = None;
    }

    /// Build a legacy transaction, sign it locally, and submit raw bytes.
    async fn sign_and_send(
        &self,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
        to: TxKind,
        value: U256,
        input: Bytes,
    ) -> Result<B256, BorrowError> {
        let tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            input,
        };

        let sig_hash = tx.signature_hash();
        let sig = self
            .signer
            .sign_hash_sync(&sig_hash)
            .map_err(|e| BorrowError::TransactionRejected {
                reason: format!("transaction signing failed: {e}"),
            })?;

        let signed = tx.into_signed(sig);
        let envelope = TxEnvelope::Legacy(signed);
        let raw = envelope.encoded_2718();

        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| BorrowError::TransactionRejected {
                reason: rejection_reason(&e),
            })?;

        Ok(*pending.tx_hash())
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Blocks on top of (and including) the receipt block. Zero if the node's
/// head lags the receipt.
pub fn confirmation_depth(receipt_block: u64, head_block: u64) -> u64 {
    if head_block < receipt_block {
        0
    } else {
        head_block - receipt_block + 1
    }
}

/// Gas price with the integer percentage buffer, never below 1 wei.
pub fn buffered_gas_price(base_price: u128) -> u128 {
    std::cmp::max(base_price.saturating_mul(GAS_PRICE_BUFFER_PCT) / 100, 1)
}

/// Readable revert reason: `Error(string)`, `Panic(uint256)` or a bare
/// UTF-8 message when the payload decodes, hex otherwise.
pub fn revert_reason(data: &[u8]) -> String {
    if data.is_empty() {
        return "empty revert data".into();
    }
    decode_revert_reason(data).unwrap_or_else(|| format!("0x{}", hex::encode(data)))
}

/// Best-effort human reason from a node error: decoded revert data if the
/// node returned any, otherwise the JSON-RPC message.
fn rejection_reason(err: &TransportError) -> String {
    match err.as_error_resp() {
        Some(payload) => match payload.as_revert_data() {
            Some(data) => revert_reason(&data),
            None => payload.message.to_string(),
        },
        None => err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
