//! Domain types for on-chain payment verification.
//!
//! Contains the decoded ledger records (`TransactionRecord`,
//! `ReceiptRecord`), the caller-supplied `PaymentRequest`, and the
//! `VerificationVerdict` returned by the engine. Addresses and amounts use
//! `alloy_primitives` so that checksum handling and 256-bit arithmetic are
//! not reimplemented here.

use std::time::Duration;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::verify::RejectReason;

// ==============================================================================
// Addresses
// ==============================================================================

/// Parse an account address into its canonical form.
///
/// Accepts any hex casing, with or without the `0x` prefix. The returned
/// `Address` compares by bytes and displays in EIP-55 checksum form, so two
/// inputs differing only in case normalize to equal values.
pub fn normalize_address(input: &str) -> Result<Address, CoreError> {
    input
        .parse::<Address>()
        .map_err(|e| CoreError::InvalidAddress {
            input: input.to_owned(),
            reason: e.to_string(),
        })
}

// ==============================================================================
// Ledger Records
// ==============================================================================

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: String,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    /// Transferred amount in wei.
    pub value: U256,
    /// Absent on legacy (pre-EIP-155) encodings.
    pub chain_id: Option<u64>,
}

/// Execution outcome recorded in a transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Failure,
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// A mined transaction's receipt. Its absence means "not yet mined",
/// which is distinct from `ReceiptStatus::Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub status: ReceiptStatus,
}

impl ReceiptRecord {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

// ==============================================================================
// Requests and Verdicts
// ==============================================================================

/// A single payment to verify. Recipient and chain id come from
/// `VerifierConfig`, not from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub tx_hash: String,
    pub expected_sender: String,
    pub expected_amount: U256,
    /// Polling budget; `None` uses the configured default.
    pub timeout: Option<Duration>,
}

impl PaymentRequest {
    pub fn new(
        tx_hash: impl Into<String>,
        expected_sender: impl Into<String>,
        expected_amount: U256,
    ) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            expected_sender: expected_sender.into(),
            expected_amount,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Final outcome of a verification. Never ambiguous: pending states are
/// resolved by the polling loop before a verdict is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationVerdict {
    Verified {
        tx_hash: String,
        transaction: TransactionRecord,
    },
    Rejected {
        reason: RejectReason,
    },
}

impl VerificationVerdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// The verified hash; `None` for every rejection, timeouts included.
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Self::Verified { tx_hash, .. } => Some(tx_hash),
            Self::Rejected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Verified { .. } => None,
            Self::Rejected { reason } => Some(reason),
        }
    }
}

/// Serializable single-pass verification result, suitable for returning
/// directly from an HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReport {
    pub verified: bool,
    pub tx_hash: String,
    pub error: Option<String>,
    pub tx_info: Option<TransactionRecord>,
}
