//! Server errors and the JSON-RPC codes they travel as.

use navmatch::VerifyError;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// JSON-RPC 2.0 reserved codes, then the server's own range.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub const TOOL_NOT_FOUND: i32 = -32803;
    pub const VERIFIER_NOT_FOUND: i32 = -32850;
    pub const VERIFICATION_ERROR: i32 = -32851;
}

#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Verifier not found: {0}")]
    VerifierNotFound(String),

    /// A ground-truth URL or site lookup failed inside the matcher.
    #[error("Verification error: {0}")]
    Verification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            McpError::ParseError(_) | McpError::Json(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::VerifierNotFound(_) => VERIFIER_NOT_FOUND,
            McpError::Verification(_) => VERIFICATION_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: None,
            },
        }
    }
}

/// Caller mistakes (unknown site, bad policy) are invalid params; anything
/// the matcher itself rejects is a verification error.
impl From<VerifyError> for McpError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::UnknownSite(_) | VerifyError::InvalidPolicy(_) => {
                McpError::InvalidParams(e.to_string())
            }
            other => McpError::Verification(other.to_string()),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_error_mapping() {
        let unknown = McpError::from(VerifyError::UnknownSite("trulia".into()));
        assert_eq!(unknown.code(), error_codes::INVALID_PARAMS);

        let policy = McpError::from(VerifyError::InvalidPolicy("sets".into()));
        assert_eq!(policy.code(), error_codes::INVALID_PARAMS);

        let malformed = McpError::from(VerifyError::MalformedUrl {
            url: "::".into(),
            reason: "no host".into(),
        });
        assert_eq!(malformed.code(), error_codes::VERIFICATION_ERROR);

        let empty = McpError::from(VerifyError::EmptyGroundTruth);
        assert_eq!(empty.code(), error_codes::VERIFICATION_ERROR);
    }

    #[test]
    fn test_error_object_carries_code_and_message() {
        let err = McpError::VerifierNotFound("v-42".into());
        let wire = serde_json::to_value(err.to_json_rpc_error(RequestId::Number(7))).unwrap();
        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["id"], 7);
        assert_eq!(wire["error"]["code"], -32850);
        assert_eq!(wire["error"]["message"], "Verifier not found: v-42");
        assert!(wire["error"].get("data").is_none());
    }
}
