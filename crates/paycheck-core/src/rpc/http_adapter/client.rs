use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::header;
use tracing::{debug, trace};

use crate::config::{parse_rpc_url, RpcTimeouts};
use crate::error::{CoreError, RpcError};
use crate::types::{ReceiptRecord, TransactionRecord};

use super::super::EthRpc;
use super::parsing::{parse_quantity, parse_receipt, parse_transaction, quantity_to_u64};
use super::protocol::{normalize_lookup_error, parse_jsonrpc_error, JsonRpcRequest, JsonRpcResponse};

/// Ethereum JSON-RPC client over HTTP(S).
///
/// Holds one pooled `reqwest::Client`, which is safe to share across
/// concurrent verifications. Nothing is cached: every call goes to the node.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: String,
    timeouts: RpcTimeouts,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a new client for an `http://` or `https://` endpoint.
    ///
    /// `timeouts.query` bounds transaction and receipt lookups,
    /// `timeouts.probe` bounds chain id and balance calls.
    pub fn new(connection: &str, timeouts: RpcTimeouts) -> Result<Self, CoreError> {
        let url = parse_rpc_url(connection)?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.query)
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            timeouts,
            next_id: AtomicU64::new(initial_request_id()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn reserve_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, CoreError> {
        let id = self.reserve_request_id();
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .json(&req)
            .send()
            .await
            .map_err(RpcError::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(RpcError::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        if !status.is_success() {
            return Err(RpcError::HttpStatus(status.as_u16()).into());
        }

        let decoded: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!("decode JSON-RPC response: {e}; body={body}"))
        })?;

        if let Some(err) = decoded.error {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl EthRpc for HttpRpcClient {
    async fn get_transaction(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionRecord>, CoreError> {
        let raw = match self
            .rpc_call(
                "eth_getTransactionByHash",
                vec![serde_json::json!(tx_hash)],
                self.timeouts.query,
            )
            .await
        {
            Ok(raw) => raw,
            Err(err) => return normalize_lookup_error(err),
        };
        parse_transaction(raw)
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<ReceiptRecord>, CoreError> {
        let raw = match self
            .rpc_call(
                "eth_getTransactionReceipt",
                vec![serde_json::json!(tx_hash)],
                self.timeouts.query,
            )
            .await
        {
            Ok(raw) => raw,
            Err(err) => return normalize_lookup_error(err),
        };
        parse_receipt(raw)
    }

    async fn get_chain_id(&self) -> Result<Option<u64>, CoreError> {
        let raw = self
            .rpc_call("eth_chainId", Vec::new(), self.timeouts.probe)
            .await?;
        if raw.is_null() {
            return Ok(None);
        }
        let chain_id = parse_quantity(Some(&raw), "chainId")?;
        quantity_to_u64(chain_id, "chainId").map(Some)
    }

    async fn get_balance(&self, address: &Address) -> Result<Option<U256>, CoreError> {
        let raw = self
            .rpc_call(
                "eth_getBalance",
                vec![
                    serde_json::json!(address.to_string()),
                    serde_json::json!("latest"),
                ],
                self.timeouts.probe,
            )
            .await?;
        if raw.is_null() {
            return Ok(None);
        }
        parse_quantity(Some(&raw), "balance").map(Some)
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}
