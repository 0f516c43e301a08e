//! Tool: verifier_update. Record the agent's current URL.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use navmatch::UpdateOutcome;

use crate::session::VerifierSessionManager;
use crate::types::{arguments, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct UpdateParams {
    verifier_id: String,
    url: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "verifier_update".to_string(),
        description: Some(
            "Set the agent's current URL, replacing the previous one. Blank and foreign-domain URLs are ignored"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "verifier_id": { "type": "string", "description": "Id returned by verifier_create" },
                "url": { "type": "string", "description": "Current browser URL" }
            },
            "required": ["verifier_id", "url"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<VerifierSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: UpdateParams = arguments(args)?;

    let mut session = session.lock().await;
    let outcome = session.update(&params.verifier_id, &params.url)?;

    Ok(ToolCallResult::json(&json!({
        "verifier_id": params.verifier_id,
        "status": outcome,
        "stored": outcome == UpdateOutcome::Stored,
    })))
}
