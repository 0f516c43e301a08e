//! Tool: verifier_reset. Clear the stored agent URL.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::VerifierSessionManager;
use crate::types::{arguments, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct ResetParams {
    verifier_id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "verifier_reset".to_string(),
        description: Some("Clear the verifier's agent URL".to_string()),
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
    let params: ResetParams = arguments(args)?;

    let mut session = session.lock().await;
    session.reset(&params.verifier_id)?;

    Ok(ToolCallResult::json(&json!({
        "verifier_id": params.verifier_id,
        "status": "reset"
    })))
}
