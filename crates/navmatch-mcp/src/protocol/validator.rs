//! JSON-RPC request validation.

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Reject requests with the wrong `jsonrpc` tag or no method name.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.trim().is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    if request.method.starts_with("rpc.") {
        return Err(McpError::InvalidRequest(format!(
            "Method names starting with \"rpc.\" are reserved: {}",
            request.method
        )));
    }

    Ok(())
}
