//! Tool: verifier_compute. Score the agent URL against ground truth.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::VerifierSessionManager;
use crate::types::{arguments, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct ComputeParams {
    verifier_id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "verifier_compute".to_string(),
        description: Some(
            "Score the current agent URL: 1.0 if it matches any ground-truth alternative, else 0.0 with a diagnostic"
                .to_string(),
        ),
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
    let params: ComputeParams = arguments(args)?;

    let session = session.lock().await;
    let result = session.compute(&params.verifier_id)?;

    Ok(ToolCallResult::json(&result))
}
