//! Tool: verifier_create. Build a verifier from ground-truth URLs.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use navmatch::{GroundTruthInput, MatchPolicy, Site, VerifyError};

use crate::session::VerifierSessionManager;
use crate::types::{arguments, McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct CreateParams {
    #[serde(default)]
    site: Option<String>,
    ground_truth: GroundTruthInput,
    #[serde(default)]
    policy: Option<Value>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "verifier_create".to_string(),
        description: Some(
            "Create a verifier from one or more ground-truth URLs (string, list, or list of lists)"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "site": {
                    "type": "string",
                    "enum": Site::ALL.iter().map(Site::as_str).collect::<Vec<_>>(),
                    "description": "Site dialect; detected from the first ground-truth host when omitted"
                },
                "ground_truth": {
                    "description": "Ground-truth URL, list of URLs, or list of URL lists",
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } },
                        { "type": "array", "items": { "type": "array", "items": { "type": "string" } } }
                    ]
                },
                "policy": {
                    "type": "object",
                    "description": "Match policy override: sets, set_overrides, extras, location, report"
                }
            },
            "required": ["ground_truth"]
        }),
    }
}

/// Parse a policy override, reporting failures as an invalid policy.
pub(crate) fn parse_policy(raw: Option<Value>) -> McpResult<Option<MatchPolicy>> {
    raw.map(|value| {
        serde_json::from_value::<MatchPolicy>(value)
            .map_err(|e| McpError::from(VerifyError::InvalidPolicy(e.to_string())))
    })
    .transpose()
}

/// Parse an optional site name.
pub(crate) fn parse_site(raw: Option<&str>) -> McpResult<Option<Site>> {
    raw.map(|s| s.parse::<Site>().map_err(McpError::from))
        .transpose()
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<VerifierSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: CreateParams = arguments(args)?;

    let site = parse_site(params.site.as_deref())?;
    let policy = parse_policy(params.policy)?;

    let mut session = session.lock().await;
    let verifier_id = session.create(site, params.ground_truth, policy)?;
    let entry = session.get(&verifier_id)?;

    Ok(ToolCallResult::json(&json!({
        "verifier_id": verifier_id,
        "site": entry.verifier.site(),
        "ground_truth_count": entry.verifier.ground_truths().len(),
    })))
}
