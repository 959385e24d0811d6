//! Shared test helpers for `paycheck-core` unit tests.
//!
//! Consolidates fixture addresses, hashes, and builders for ledger records
//! so that tests across modules share a single source of truth for dummy
//! data construction.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use crate::config::VerifierConfig;
use crate::rpc::mock::MockRpc;
use crate::types::{ReceiptRecord, ReceiptStatus, TransactionRecord};
use crate::verify::PaymentVerifier;

// ==============================================================================
// Fixture Values
// ==============================================================================

pub const CHAIN_ID: u64 = 10143;
pub const SENDER: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";
pub const RECIPIENT: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";
pub const STRANGER: &str = "0x1111111111111111111111111111111111111111";

pub const HASH_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const HASH_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

pub fn addr(s: &str) -> Address {
    s.parse().expect("fixture address must parse")
}

// ==============================================================================
// Record Builders
// ==============================================================================

/// A transfer from `SENDER` to `RECIPIENT` on `CHAIN_ID`. Override
/// individual fields after construction when needed.
pub fn payment_tx(hash: &str, value: U256) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_owned(),
        from: addr(SENDER),
        to: Some(addr(RECIPIENT)),
        value,
        chain_id: Some(CHAIN_ID),
    }
}

pub fn success_receipt() -> ReceiptRecord {
    ReceiptRecord {
        status: ReceiptStatus::Success,
    }
}

pub fn failed_receipt() -> ReceiptRecord {
    ReceiptRecord {
        status: ReceiptStatus::Failure,
    }
}

// ==============================================================================
// Verifier Builders
// ==============================================================================

pub fn test_config() -> VerifierConfig {
    VerifierConfig::new("http://127.0.0.1:8545", CHAIN_ID, RECIPIENT)
        .expect("fixture config must be valid")
}

/// Returns the mock alongside the verifier so tests can inspect call counts.
pub fn verifier_with(rpc: MockRpc) -> (Arc<MockRpc>, PaymentVerifier) {
    let rpc = Arc::new(rpc);
    let verifier = PaymentVerifier::new(rpc.clone(), test_config());
    (rpc, verifier)
}
