use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::{CoreError, RpcError};
use crate::types::{ReceiptRecord, TransactionRecord};

use super::EthRpc;

/// A receipt that only becomes visible after the transaction has been
/// polled `hidden_polls` times, simulating block inclusion.
struct ScriptedReceipt {
    receipt: ReceiptRecord,
    hidden_polls: usize,
}

/// A mock Ethereum RPC backend for testing. Returns canned ledger data
/// populated via the builder pattern and counts calls per method.
pub struct MockRpc {
    transactions: HashMap<String, TransactionRecord>,
    receipts: HashMap<String, ScriptedReceipt>,
    chain_id: Option<u64>,
    balances: HashMap<Address, U256>,
    unavailable: bool,
    receipt_faults: HashSet<usize>,
    receipt_polls: Mutex<HashMap<String, usize>>,
    transaction_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            transactions: HashMap::new(),
            receipts: HashMap::new(),
            chain_id: Some(10143),
            balances: HashMap::new(),
            unavailable: false,
            receipt_faults: HashSet::new(),
        }
    }

    pub fn transaction_calls(&self) -> usize {
        self.transaction_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    fn outage() -> CoreError {
        CoreError::Rpc(RpcError::HttpStatus(503))
    }
}

pub struct MockRpcBuilder {
    transactions: HashMap<String, TransactionRecord>,
    receipts: HashMap<String, ScriptedReceipt>,
    chain_id: Option<u64>,
    balances: HashMap<Address, U256>,
    unavailable: bool,
    receipt_faults: HashSet<usize>,
}

impl MockRpcBuilder {
    /// Register a transaction with no receipt (pending forever).
    pub fn with_pending_tx(mut self, tx: TransactionRecord) -> Self {
        self.transactions.insert(tx.hash.clone(), tx);
        self
    }

    /// Register a mined transaction whose receipt is visible immediately.
    pub fn with_mined_tx(self, tx: TransactionRecord, receipt: ReceiptRecord) -> Self {
        self.with_tx_mined_after(tx, receipt, 0)
    }

    /// Register a transaction whose receipt appears on poll `polls + 1`.
    pub fn with_tx_mined_after(
        mut self,
        tx: TransactionRecord,
        receipt: ReceiptRecord,
        polls: usize,
    ) -> Self {
        self.receipts.insert(
            tx.hash.clone(),
            ScriptedReceipt {
                receipt,
                hidden_polls: polls,
            },
        );
        self.transactions.insert(tx.hash.clone(), tx);
        self
    }

    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.balances.insert(address, balance);
        self
    }

    /// Every call fails as if the node were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Receipt poll number `poll` (1-based, per transaction) fails with a
    /// gateway error. The failed poll still counts toward `hidden_polls`.
    pub fn with_receipt_fault_on_poll(mut self, poll: usize) -> Self {
        self.receipt_faults.insert(poll);
        self
    }

    pub fn build(self) -> MockRpc {
        MockRpc {
            transactions: self.transactions,
            receipts: self.receipts,
            chain_id: self.chain_id,
            balances: self.balances,
            unavailable: self.unavailable,
            receipt_faults: self.receipt_faults,
            receipt_polls: Mutex::new(HashMap::new()),
            transaction_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EthRpc for MockRpc {
    async fn get_transaction(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionRecord>, CoreError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(Self::outage());
        }
        Ok(self.transactions.get(tx_hash).cloned())
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<ReceiptRecord>, CoreError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(Self::outage());
        }
        let Some(scripted) = self.receipts.get(tx_hash) else {
            return Ok(None);
        };

        let mut polls = self
            .receipt_polls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let seen = polls.entry(tx_hash.to_owned()).or_insert(0);
        *seen += 1;
        if self.receipt_faults.contains(&*seen) {
            return Err(Self::outage());
        }
        if *seen > scripted.hidden_polls {
            Ok(Some(scripted.receipt))
        } else {
            Ok(None)
        }
    }

    async fn get_chain_id(&self) -> Result<Option<u64>, CoreError> {
        if self.unavailable {
            return Err(Self::outage());
        }
        Ok(self.chain_id)
    }

    async fn get_balance(&self, address: &Address) -> Result<Option<U256>, CoreError> {
        if self.unavailable {
            return Err(Self::outage());
        }
        Ok(self.balances.get(address).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn receipt_appears_after_scripted_polls() {
        let tx = payment_tx(HASH_A, U256::from(100u64));
        let rpc = MockRpc::builder()
            .with_tx_mined_after(tx, success_receipt(), 2)
            .build();

        assert!(rpc.get_transaction_receipt(HASH_A).await.unwrap().is_none());
        assert!(rpc.get_transaction_receipt(HASH_A).await.unwrap().is_none());
        let receipt = rpc.get_transaction_receipt(HASH_A).await.unwrap();
        assert_eq!(receipt, Some(success_receipt()));
        assert_eq!(rpc.receipt_calls(), 3);
    }

    #[tokio::test]
    async fn receipt_fault_hits_only_the_scripted_poll() {
        let tx = payment_tx(HASH_A, U256::from(100u64));
        let rpc = MockRpc::builder()
            .with_tx_mined_after(tx, success_receipt(), 2)
            .with_receipt_fault_on_poll(2)
            .build();

        assert!(rpc.get_transaction_receipt(HASH_A).await.unwrap().is_none());
        assert!(matches!(
            rpc.get_transaction_receipt(HASH_A).await,
            Err(CoreError::Rpc(RpcError::HttpStatus(503)))
        ));
        let receipt = rpc.get_transaction_receipt(HASH_A).await.unwrap();
        assert_eq!(receipt, Some(success_receipt()));
        assert!(rpc.get_transaction(HASH_A).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unavailable_fails_every_call() {
        let rpc = MockRpc::builder().unavailable().build();
        assert!(rpc.get_transaction(HASH_A).await.is_err());
        assert!(rpc.get_transaction_receipt(HASH_A).await.is_err());
        assert!(rpc.get_chain_id().await.is_err());
        assert!(rpc.get_balance(&Address::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn unknown_hash_is_absent() {
        let rpc = MockRpc::builder().build();
        assert!(rpc.get_transaction(HASH_A).await.unwrap().is_none());
        assert_eq!(rpc.transaction_calls(), 1);
    }
}
