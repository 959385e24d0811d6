use crate::error::{CoreError, RpcError};

/// JSON-RPC "invalid params", returned by most nodes for a malformed hash.
pub(super) const INVALID_PARAMS: i64 = -32602;

#[derive(serde::Serialize)]
pub(super) struct JsonRpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) id: u64,
    pub(super) method: &'a str,
    pub(super) params: Vec<serde_json::Value>,
}

#[derive(serde::Deserialize)]
pub(super) struct JsonRpcResponse {
    pub(super) result: Option<serde_json::Value>,
    pub(super) error: Option<serde_json::Value>,
}

/// Parse a JSON-RPC error value into a structured `CoreError`.
///
/// The JSON-RPC spec defines errors as `{"code": <int>, "message": <string>}`.
/// If the error value matches that shape, we produce a `ServerError`;
/// otherwise we fall back to `InvalidResponse` with the raw JSON.
pub(super) fn parse_jsonrpc_error(err: serde_json::Value) -> CoreError {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    if let Ok(parsed) = serde_json::from_value::<JsonRpcError>(err.clone()) {
        CoreError::Rpc(RpcError::ServerError {
            code: parsed.code,
            message: parsed.message,
        })
    } else {
        CoreError::Rpc(RpcError::InvalidResponse(format!(
            "non-standard JSON-RPC error: {err}"
        )))
    }
}

/// Treat "invalid params" on a hash lookup as absence: a hash the node
/// cannot even parse is a hash it has no record of.
pub(super) fn normalize_lookup_error<T>(err: CoreError) -> Result<Option<T>, CoreError> {
    match err {
        CoreError::Rpc(RpcError::ServerError { code, .. }) if code == INVALID_PARAMS => Ok(None),
        other => Err(other),
    }
}
