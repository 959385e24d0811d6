use alloy_primitives::{Address, U256};

use crate::error::CoreError;
use crate::types::{ReceiptRecord, ReceiptStatus, TransactionRecord};

/// Decode an `eth_getTransactionByHash` result. `null` means the node has
/// no record of the hash.
pub(super) fn parse_transaction(
    raw: serde_json::Value,
) -> Result<Option<TransactionRecord>, CoreError> {
    if raw.is_null() {
        return Ok(None);
    }

    let hash = raw
        .get("hash")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData("missing hash".into()))?
        .to_owned();
    let from = parse_address(raw.get("from"), "from")?;
    let to = parse_opt_address(raw.get("to"), "to")?;
    // Some nodes omit `value` for zero transfers.
    let value = parse_opt_quantity(raw.get("value"), "value")?.unwrap_or(U256::ZERO);
    let chain_id = parse_opt_quantity(raw.get("chainId"), "chainId")?
        .map(|id| quantity_to_u64(id, "chainId"))
        .transpose()?;

    Ok(Some(TransactionRecord {
        hash,
        from,
        to,
        value,
        chain_id,
    }))
}

/// Decode an `eth_getTransactionReceipt` result. `null` means pending.
pub(super) fn parse_receipt(raw: serde_json::Value) -> Result<Option<ReceiptRecord>, CoreError> {
    if raw.is_null() {
        return Ok(None);
    }
    if !raw.is_object() {
        return Err(CoreError::InvalidTxData(format!(
            "receipt must be an object, got {raw}"
        )));
    }

    Ok(Some(ReceiptRecord {
        status: parse_status(raw.get("status")),
    }))
}

/// Only the exact string `"0x1"` is success; `"0x0"`, absence (pre-Byzantium
/// receipts carry a state root instead) and anything else are failure.
pub(super) fn parse_status(value: Option<&serde_json::Value>) -> ReceiptStatus {
    match value.and_then(serde_json::Value::as_str) {
        Some("0x1") => ReceiptStatus::Success,
        _ => ReceiptStatus::Failure,
    }
}

pub(super) fn parse_address(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Address, CoreError> {
    parse_opt_address(value, field)?
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))
}

pub(super) fn parse_opt_address(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<Address>, CoreError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid {field} `{s}`: {e}"))),
        Some(other) => Err(CoreError::InvalidTxData(format!(
            "{field} must be a hex string, got {other}"
        ))),
    }
}

pub(super) fn parse_quantity(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<U256, CoreError> {
    parse_opt_quantity(value, field)?
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))
}

// Quantities are `0x`-prefixed big-endian hex without leading zeros, but
// some nodes pad them, so any hex digit string is accepted.
pub(super) fn parse_opt_quantity(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<U256>, CoreError> {
    let s = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => {
            return Err(CoreError::InvalidTxData(format!(
                "{field} must be a hex quantity, got {other}"
            )))
        }
    };

    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| CoreError::InvalidTxData(format!("{field} `{s}` is missing 0x prefix")))?;
    if digits.is_empty() {
        return Err(CoreError::InvalidTxData(format!("{field} `{s}` has no digits")));
    }

    U256::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|e| CoreError::InvalidTxData(format!("invalid {field} `{s}`: {e}")))
}

pub(super) fn quantity_to_u64(value: U256, field: &str) -> Result<u64, CoreError> {
    u64::try_from(value)
        .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {value}")))
}
