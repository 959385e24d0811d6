mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::utils::format_units;
use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use paycheck_core::config::TOKEN_DECIMALS;
use paycheck_core::rpc::{EthRpc, HttpRpcClient};
use paycheck_core::{PaymentRequest, PaymentVerifier, VerificationVerdict, VerifierConfig};

use cli::{Cli, Command, PaymentArgs};

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let config = VerifierConfig::new(&args.rpc_url, args.chain_id, &args.recipient)
        .context("invalid verifier configuration")?
        .with_payment_timeout(args.payment_timeout())
        .with_poll_interval(args.poll_interval())
        .context("invalid poll interval")?;

    let rpc = Arc::new(
        HttpRpcClient::new(&config.rpc_url, config.timeouts).context("create RPC client")?,
    );

    // Probe the node before doing any work so connection problems surface
    // with an actionable message instead of as a rejected payment.
    let reported_chain_id = rpc
        .get_chain_id()
        .await
        .map_err(|err| {
            let message = format_rpc_connect_error(&config.rpc_url, &err.to_string());
            eyre!(message).wrap_err("while attempting to connect to the RPC endpoint")
        })?
        .ok_or_else(|| eyre!("node at `{}` did not report a chain id", config.rpc_url))?;

    tracing::info!(
        rpc_url = %config.rpc_url,
        chain_id = reported_chain_id,
        recipient = %config.recipient,
        "connected to RPC endpoint"
    );
    if reported_chain_id != config.chain_id {
        tracing::warn!(
            expected = config.chain_id,
            actual = reported_chain_id,
            "node serves a different chain; payments will be rejected as wrong-chain or not found"
        );
    }

    let verifier = PaymentVerifier::new(rpc, config);

    match args.command {
        Command::Verify { payment, timeout } => {
            run_verify(&verifier, payment, timeout.map(Duration::from_secs)).await
        }
        Command::Report { payment } => {
            let report = verifier
                .payment_report(&payment.tx_hash, &payment.sender, payment.amount)
                .await;
            print_json(&report)?;
            Ok(exit_code(report.verified))
        }
        Command::Check => {
            let connected = verifier.is_connected().await;
            print_json(&CheckOutput {
                rpc_url: &verifier.config().rpc_url,
                expected_chain_id: verifier.config().chain_id,
                reported_chain_id,
                connected,
            })?;
            Ok(exit_code(connected))
        }
        Command::Balance { address } => {
            let wei = verifier
                .get_balance(&address)
                .await
                .ok_or_else(|| eyre!("could not fetch balance for `{address}`"))?;
            let tokens = format_units(wei, TOKEN_DECIMALS)
                .map_err(|e| eyre!("format balance {wei}: {e}"))?;
            print_json(&serde_json::json!({
                "address": address,
                "wei": wei.to_string(),
                "tokens": tokens,
            }))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    rpc_url: &'a str,
    expected_chain_id: u64,
    reported_chain_id: u64,
    connected: bool,
}

#[derive(Serialize)]
struct VerifyOutput {
    verified: bool,
    tx_hash: Option<String>,
    error: Option<String>,
}

/// Poll for the payment, giving up early on Ctrl-C.
async fn run_verify(
    verifier: &PaymentVerifier,
    payment: PaymentArgs,
    timeout: Option<Duration>,
) -> eyre::Result<ExitCode> {
    let mut request = PaymentRequest::new(payment.tx_hash, payment.sender, payment.amount);
    request.timeout = timeout;

    let verdict = tokio::select! {
        verdict = verifier.verify(&request) => verdict,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listen for Ctrl-C")?;
            tracing::warn!(tx_hash = %request.tx_hash, "verification interrupted");
            return Ok(ExitCode::from(130));
        }
    };

    let output = match &verdict {
        VerificationVerdict::Verified { tx_hash, .. } => VerifyOutput {
            verified: true,
            tx_hash: Some(tx_hash.clone()),
            error: None,
        },
        VerificationVerdict::Rejected { reason } => VerifyOutput {
            verified: false,
            tx_hash: None,
            error: Some(reason.to_string()),
        },
    };
    print_json(&output)?;
    Ok(exit_code(verdict.is_verified()))
}

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{rendered}");
    Ok(())
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") || source_error.contains("failed to lookup address") {
        lines.push(
            "hint: hostname resolution failed; verify the endpoint hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("tls")
        || source_error.contains("certificate")
        || source_error.contains("SSL")
    {
        lines.push(
            "hint: TLS handshake failed; verify certificate trust and that the endpoint uses HTTPS"
                .into(),
        );
    } else if source_error.contains("status 401") || source_error.contains("status 403") {
        lines.push("hint: authentication failed; verify the API key in the endpoint URL".into());
    } else if source_error.contains("status 404") {
        lines.push(
            "hint: endpoint path is invalid; verify the full RPC URL including any key path".into(),
        );
    } else if source_error.contains("status 429") {
        lines.push("hint: the provider is rate limiting requests; retry later".into());
    } else if source_error.contains("error sending request for url") {
        lines.push("hint: request could not be sent; verify URL format, network access, and endpoint reachability".into());
    }

    lines.join("\n")
}
