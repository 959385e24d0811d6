use std::time::Duration;

use alloy_primitives::U256;
use clap::{Args, Parser, Subcommand};

use paycheck_core::config::{
    DEFAULT_CHAIN_ID, DEFAULT_PAYMENT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_RECIPIENT,
    DEFAULT_RPC_URL,
};

/// paycheck: verify native-token payments on an EVM chain by transaction hash.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON-RPC endpoint of the ledger node.
    #[arg(long, default_value = DEFAULT_RPC_URL, env = "PAYCHECK_RPC_URL")]
    pub rpc_url: String,

    /// Chain id payments must be made on.
    #[arg(long, default_value_t = DEFAULT_CHAIN_ID, env = "PAYCHECK_CHAIN_ID")]
    pub chain_id: u64,

    /// Address that must receive payments.
    #[arg(long, default_value = DEFAULT_RECIPIENT, env = "PAYCHECK_RECIPIENT")]
    pub recipient: String,

    /// Default time to wait for a pending payment to be mined, in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_PAYMENT_TIMEOUT.as_secs(),
        env = "PAYCHECK_PAYMENT_TIMEOUT"
    )]
    pub payment_timeout: u64,

    /// Delay between polls of a pending transaction, in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
        env = "PAYCHECK_POLL_INTERVAL"
    )]
    pub poll_interval: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Wait for a payment to be mined and verify it.
    Verify {
        #[command(flatten)]
        payment: PaymentArgs,

        /// Override the default payment timeout, in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Check a payment once, without waiting, and print a JSON report.
    Report {
        #[command(flatten)]
        payment: PaymentArgs,
    },

    /// Check that the node is reachable and serves the configured chain.
    Check,

    /// Print the balance of an address.
    Balance {
        /// Account address (any hex casing).
        address: String,
    },
}

#[derive(Args)]
pub struct PaymentArgs {
    /// Hash of the payment transaction.
    #[arg(long)]
    pub tx_hash: String,

    /// Address the payment must come from.
    #[arg(long)]
    pub sender: String,

    /// Minimum amount in wei (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_wei)]
    pub amount: U256,
}

impl Cli {
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

fn parse_wei(value: &str) -> Result<U256, String> {
    value
        .parse::<U256>()
        .map_err(|e| format!("invalid wei amount `{value}`: {e}"))
}
