//! Tool: url_match. One-shot comparison without a stored verifier.

use serde::Deserialize;
use serde_json::{json, Value};

use navmatch::{GroundTruthInput, Verifier};

use super::verifier_create::{parse_policy, parse_site};
use crate::types::{arguments, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct MatchParams {
    #[serde(default)]
    site: Option<String>,
    agent_url: String,
    ground_truth: GroundTruthInput,
    #[serde(default)]
    policy: Option<Value>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "url_match".to_string(),
        description: Some("Compare one agent URL against ground truth and return the result".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "site": { "type": "string", "description": "Site dialect; detected when omitted" },
                "agent_url": { "type": "string" },
                "ground_truth": {
                    "description": "Ground-truth URL, list of URLs, or list of URL lists"
                },
                "policy": { "type": "object" }
            },
            "required": ["agent_url", "ground_truth"]
        }),
    }
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: MatchParams = arguments(args)?;

    let mut verifier = match parse_site(params.site.as_deref())? {
        Some(site) => Verifier::new(site, params.ground_truth)?,
        None => Verifier::detect(params.ground_truth)?,
    };
    if let Some(policy) = parse_policy(params.policy)? {
        verifier = verifier.with_policy(policy);
    }
    verifier.update(&params.agent_url);

    Ok(ToolCallResult::json(&verifier.compute()))
}
