//! Payment verification engine.
//!
//! [`PaymentVerifier::check_payment`] applies the acceptance rule once:
//! address format, existence, receipt, execution status, sender, recipient,
//! amount and chain id, stopping at the first failed clause.
//! [`PaymentVerifier::verify`] repeats that check on the tokio timer while the
//! payment is not yet final and gives up at the request's deadline.
//!
//! A gateway fault while fetching the transaction is terminal
//! ([`RejectReason::Unavailable`]). Once the transaction is known, a fault on
//! the receipt lookup reads like a missing receipt and is retried.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use futures::future::join_all;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::VerifierConfig;
use crate::error::CoreError;
use crate::rpc::EthRpc;
use crate::types::{
    normalize_address, PaymentReport, PaymentRequest, TransactionRecord, VerificationVerdict,
};

// ==============================================================================
// Rejection Reasons
// ==============================================================================

/// Why a payment was not accepted.
///
/// [`RejectReason::Pending`] and [`RejectReason::ReceiptUnavailable`] are
/// transient; every other reason is a fact that waiting will not change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("invalid address format: {0}")]
    InvalidAddress(String),

    #[error("transaction {tx_hash} not found on chain")]
    NotFound { tx_hash: String },

    #[error("transaction {tx_hash} pending or not yet mined")]
    Pending { tx_hash: String },

    /// The transaction exists but its receipt lookup hit a gateway fault.
    #[error("receipt for transaction {tx_hash} unavailable: {reason}")]
    ReceiptUnavailable { tx_hash: String, reason: String },

    #[error("transaction {tx_hash} failed")]
    TransactionFailed { tx_hash: String },

    #[error("sender mismatch: expected {expected}, got {actual}")]
    SenderMismatch { expected: Address, actual: Address },

    #[error("transaction has no recipient (contract creation?)")]
    NoRecipient,

    #[error("recipient mismatch: expected {expected}, got {actual}")]
    RecipientMismatch { expected: Address, actual: Address },

    #[error("amount too low: expected {expected}, got {actual}")]
    AmountTooLow { expected: U256, actual: U256 },

    #[error("wrong chain: expected {expected}, got {actual}")]
    WrongChain { expected: u64, actual: u64 },

    #[error("ledger node unavailable: {0}")]
    Unavailable(String),

    #[error("payment verification timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { timeout: Duration },
}

impl RejectReason {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Pending { .. } | Self::ReceiptUnavailable { .. })
    }

    fn unavailable(err: CoreError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

// ==============================================================================
// Payment Verifier
// ==============================================================================

/// Verifies native-token payments against a ledger node.
///
/// Holds no per-request state, so one instance can be shared (e.g. behind an
/// `Arc`) by any number of concurrent verifications.
pub struct PaymentVerifier {
    rpc: Arc<dyn EthRpc>,
    config: VerifierConfig,
}

impl PaymentVerifier {
    pub fn new(rpc: Arc<dyn EthRpc>, config: VerifierConfig) -> Self {
        Self { rpc, config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run the acceptance rule once.
    ///
    /// Clauses are evaluated in a fixed order and the first failure wins:
    /// address format, existence, receipt presence, execution status,
    /// sender, recipient, amount, chain id. On success the transaction
    /// fetched in this same pass is returned.
    pub async fn check_payment(
        &self,
        tx_hash: &str,
        expected_sender: &str,
        expected_amount: U256,
    ) -> Result<TransactionRecord, RejectReason> {
        let expected_sender = normalize_address(expected_sender)
            .map_err(|e| RejectReason::InvalidAddress(e.to_string()))?;
        let recipient = self.config.recipient;

        let tx = self
            .rpc
            .get_transaction(tx_hash)
            .await
            .map_err(RejectReason::unavailable)?
            .ok_or_else(|| RejectReason::NotFound {
                tx_hash: tx_hash.to_owned(),
            })?;

        let receipt = self
            .rpc
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|err| {
                warn!(
                    %tx_hash,
                    error = %err,
                    "receipt lookup failed; treating payment as not yet final"
                );
                RejectReason::ReceiptUnavailable {
                    tx_hash: tx_hash.to_owned(),
                    reason: err.to_string(),
                }
            })?
            .ok_or_else(|| RejectReason::Pending {
                tx_hash: tx_hash.to_owned(),
            })?;

        if !receipt.is_success() {
            return Err(RejectReason::TransactionFailed {
                tx_hash: tx_hash.to_owned(),
            });
        }

        if tx.from != expected_sender {
            return Err(RejectReason::SenderMismatch {
                expected: expected_sender,
                actual: tx.from,
            });
        }

        match tx.to {
            None => return Err(RejectReason::NoRecipient),
            Some(to) if to != recipient => {
                return Err(RejectReason::RecipientMismatch {
                    expected: recipient,
                    actual: to,
                });
            }
            Some(_) => {}
        }

        // Overpayment is accepted.
        if tx.value < expected_amount {
            return Err(RejectReason::AmountTooLow {
                expected: expected_amount,
                actual: tx.value,
            });
        }

        // Legacy encodings may omit the chain id; only a present, different
        // id is rejected.
        if let Some(chain_id) = tx.chain_id {
            if chain_id != self.config.chain_id {
                return Err(RejectReason::WrongChain {
                    expected: self.config.chain_id,
                    actual: chain_id,
                });
            }
        }

        Ok(tx)
    }

    /// Poll until the payment is verified, rejected, or the request's
    /// timeout (or the configured default) elapses.
    ///
    /// Only a pending transaction, or one whose receipt lookup failed, is
    /// retried, after a fixed
    /// `poll_interval` sleep on the tokio timer. The deadline is checked
    /// between iterations; an in-flight RPC call is bounded only by its own
    /// request timeout.
    pub async fn verify(&self, request: &PaymentRequest) -> VerificationVerdict {
        let timeout = request.timeout.unwrap_or(self.config.payment_timeout);
        let started = Instant::now();
        let mut attempts: u32 = 0;

        while started.elapsed() < timeout {
            attempts += 1;
            match self
                .check_payment(
                    &request.tx_hash,
                    &request.expected_sender,
                    request.expected_amount,
                )
                .await
            {
                Ok(transaction) => {
                    info!(
                        tx_hash = %request.tx_hash,
                        from = %transaction.from,
                        value = %transaction.value,
                        attempts,
                        "payment verified"
                    );
                    return VerificationVerdict::Verified {
                        tx_hash: request.tx_hash.clone(),
                        transaction,
                    };
                }
                Err(reason) if reason.is_retryable() => {
                    let remaining = timeout.saturating_sub(started.elapsed());
                    debug!(
                        tx_hash = %request.tx_hash,
                        attempts,
                        ?remaining,
                        %reason,
                        "payment not final yet; retrying"
                    );
                    sleep(self.config.poll_interval.min(remaining)).await;
                }
                Err(reason) => {
                    warn!(tx_hash = %request.tx_hash, attempts, %reason, "payment verification failed");
                    return VerificationVerdict::Rejected { reason };
                }
            }
        }

        warn!(
            tx_hash = %request.tx_hash,
            attempts,
            timeout_secs = timeout.as_secs_f64(),
            "payment verification timed out"
        );
        VerificationVerdict::Rejected {
            reason: RejectReason::TimedOut { timeout },
        }
    }

    /// Verify several independent payments concurrently. Results are in
    /// request order.
    pub async fn verify_many(&self, requests: &[PaymentRequest]) -> Vec<VerificationVerdict> {
        join_all(requests.iter().map(|request| self.verify(request))).await
    }

    /// Boundary entry point: `(verified, tx_hash)`.
    ///
    /// The hash is echoed back only on success. A missing hash is rejected
    /// without contacting the node.
    pub async fn verify_payment(
        &self,
        sender: &str,
        expected_amount: U256,
        tx_hash: Option<&str>,
        timeout: Option<Duration>,
    ) -> (bool, Option<String>) {
        let Some(tx_hash) = tx_hash.filter(|hash| !hash.is_empty()) else {
            debug!("payment verification requested without a transaction hash");
            return (false, None);
        };

        let mut request = PaymentRequest::new(tx_hash, sender, expected_amount);
        request.timeout = timeout;

        match self.verify(&request).await {
            VerificationVerdict::Verified { tx_hash, .. } => (true, Some(tx_hash)),
            VerificationVerdict::Rejected { .. } => (false, None),
        }
    }

    /// Single-pass check packaged as a serializable report. Pending
    /// transactions are reported as not verified rather than awaited.
    pub async fn payment_report(
        &self,
        tx_hash: &str,
        sender: &str,
        expected_amount: U256,
    ) -> PaymentReport {
        match self.check_payment(tx_hash, sender, expected_amount).await {
            Ok(transaction) => PaymentReport {
                verified: true,
                tx_hash: tx_hash.to_owned(),
                error: None,
                tx_info: Some(transaction),
            },
            Err(reason) => PaymentReport {
                verified: false,
                tx_hash: tx_hash.to_owned(),
                error: Some(reason.to_string()),
                tx_info: None,
            },
        }
    }

    /// True when the node answers `eth_chainId` with the configured chain.
    pub async fn is_connected(&self) -> bool {
        match self.rpc.get_chain_id().await {
            Ok(Some(chain_id)) if chain_id == self.config.chain_id => true,
            Ok(Some(chain_id)) => {
                warn!(
                    expected = self.config.chain_id,
                    actual = chain_id,
                    "node reports a different chain"
                );
                false
            }
            Ok(None) => false,
            Err(err) => {
                warn!(error = %err, "RPC connection check failed");
                false
            }
        }
    }

    /// Balance in wei; `None` if the address is malformed or the node
    /// cannot answer.
    pub async fn get_balance(&self, address: &str) -> Option<U256> {
        let address = match normalize_address(address) {
            Ok(address) => address,
            Err(err) => {
                debug!(error = %err, "balance requested for malformed address");
                return None;
            }
        };
        match self.rpc.get_balance(&address).await {
            Ok(balance) => balance,
            Err(err) => {
                warn!(%address, error = %err, "failed to get balance");
                None
            }
        }
    }
}
