//! Tool: verifier_close. Drop a verifier.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::VerifierSessionManager;
use crate::types::{arguments, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct CloseParams {
    verifier_id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "verifier_close".to_string(),
        description: Some("Close a verifier and free its slot".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "verifier_id": { "type": "string" }
            },
            "required": ["verifier_id"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<VerifierSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: CloseParams = arguments(args)?;

    let mut session = session.lock().await;
    session.close(&params.verifier_id)?;

    Ok(ToolCallResult::json(&json!({
        "verifier_id": params.verifier_id,
        "status": "closed"
    })))
}
