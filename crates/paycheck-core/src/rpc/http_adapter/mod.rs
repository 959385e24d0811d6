//! Native JSON-RPC client for Ethereum-compatible endpoints.
//!
//! Implements [`EthRpc`](super::EthRpc) over JSON-RPC using `reqwest`, with
//! per-method request timeouts and hex decoding of quantities, addresses,
//! and receipt status codes.

mod client;
mod parsing;
mod protocol;

pub use client::HttpRpcClient;
