//! EVM JSON-RPC abstraction layer.
//!
//! Defines the [`EthRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockRpc`).

mod http_adapter;
#[cfg(test)]
pub mod mock;

pub use http_adapter::HttpRpcClient;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{ReceiptRecord, TransactionRecord};

/// Minimal read-only subset of the Ethereum JSON-RPC API needed to verify
/// payments.
///
/// `Ok(None)` means the node has no record; `Err` means the node could not
/// be asked (transport failure, non-2xx status, undecodable payload).
/// Implementations must not cache: pending state changes between polls.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// `eth_getTransactionByHash`.
    async fn get_transaction(&self, tx_hash: &str)
        -> Result<Option<TransactionRecord>, CoreError>;

    /// `eth_getTransactionReceipt`. Returns `None` while the transaction is
    /// pending.
    async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<ReceiptRecord>, CoreError>;

    /// `eth_chainId`.
    async fn get_chain_id(&self) -> Result<Option<u64>, CoreError>;

    /// `eth_getBalance` at the `latest` block, in wei.
    async fn get_balance(&self, address: &Address) -> Result<Option<U256>, CoreError>;
}
