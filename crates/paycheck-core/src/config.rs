//! Process-wide verifier configuration.
//!
//! Read once at startup and passed by value into the gateway and engine
//! constructors, so the core never consults ambient global state.

use std::time::Duration;

use alloy_primitives::Address;
use reqwest::Url;

use crate::error::CoreError;
use crate::types::normalize_address;

/// Public Monad testnet endpoint.
pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
/// Monad testnet chain id.
pub const DEFAULT_CHAIN_ID: u64 = 10143;
/// Placeholder treasury; deployments are expected to override it.
pub const DEFAULT_RECIPIENT: &str = "0x0000000000000000000000000000000000000001";
/// Native token decimals (MON, like ETH, has 18).
pub const TOKEN_DECIMALS: u8 = 18;

pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ==============================================================================
// RPC Timeouts
// ==============================================================================

/// Per-request network timeouts for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcTimeouts {
    /// Transaction and receipt lookups.
    pub query: Duration,
    /// Lightweight checks: chain id and balance.
    pub probe: Duration,
}

impl Default for RpcTimeouts {
    fn default() -> Self {
        Self {
            query: Duration::from_secs(10),
            probe: Duration::from_secs(5),
        }
    }
}

// ==============================================================================
// Verifier Config
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Payment recipient, normalized at construction.
    pub recipient: Address,
    /// Default polling budget when a request does not carry its own.
    pub payment_timeout: Duration,
    /// Fixed backoff between polls while a transaction is pending.
    pub poll_interval: Duration,
    pub timeouts: RpcTimeouts,
}

impl VerifierConfig {
    /// Validate the endpoint URL and normalize the recipient address.
    pub fn new(rpc_url: &str, chain_id: u64, recipient: &str) -> Result<Self, CoreError> {
        Ok(Self {
            rpc_url: parse_rpc_url(rpc_url)?,
            chain_id,
            recipient: normalize_address(recipient)?,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeouts: RpcTimeouts::default(),
        })
    }

    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    /// A zero interval is rejected: it would turn the polling loop into a
    /// busy loop against the node.
    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::InvalidConfig(
                "poll interval must be greater than zero".to_owned(),
            ));
        }
        self.poll_interval = interval;
        Ok(self)
    }

    pub fn with_timeouts(mut self, timeouts: RpcTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

pub(crate) fn parse_rpc_url(connection: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(connection).map_err(|e| {
        CoreError::InvalidConfig(format!(
            "invalid RPC URL `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(connection.to_owned()),
        other => Err(CoreError::InvalidConfig(format!(
            "unsupported RPC URL scheme `{other}`; expected http or https"
        ))),
    }
}
