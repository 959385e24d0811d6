pub mod config;
pub mod error;
pub mod rpc;
#[cfg(test)]
mod test_util;
pub mod types;
pub mod verify;

pub use config::{RpcTimeouts, VerifierConfig};
pub use error::{CoreError, RpcError};
pub use types::{
    normalize_address, PaymentReport, PaymentRequest, ReceiptRecord, ReceiptStatus,
    TransactionRecord, VerificationVerdict,
};
pub use verify::{PaymentVerifier, RejectReason};
