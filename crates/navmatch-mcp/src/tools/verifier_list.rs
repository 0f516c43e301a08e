//! Tool: verifier_list. List live verifiers.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Value};

use crate::session::VerifierSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "verifier_list".to_string(),
        description: Some("List live verifiers with site, ground-truth count and creation time".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn execute(
    _args: Value,
    session: &Arc<Mutex<VerifierSessionManager>>,
) -> McpResult<ToolCallResult> {
    let session = session.lock().await;
    let verifiers = session.list();

    Ok(ToolCallResult::json(&json!({
        "count": verifiers.len(),
        "max": session.config().max_verifiers,
        "verifiers": verifiers,
    })))
}
