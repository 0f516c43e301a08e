//! Tool: url_parse. Show the canonical search record for a URL.

use serde::Deserialize;
use serde_json::{json, Value};

use navmatch::Site;

use super::verifier_create::parse_site;
use crate::types::{arguments, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct ParseParams {
    #[serde(default)]
    site: Option<String>,
    url: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "url_parse".to_string(),
        description: Some(
            "Parse a URL into its canonical record: category, location and normalized filters".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "site": { "type": "string", "description": "Site dialect; detected when omitted" },
                "url": { "type": "string" }
            },
            "required": ["url"]
        }),
    }
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: ParseParams = arguments(args)?;

    let site = match parse_site(params.site.as_deref())? {
        Some(site) => site,
        None => Site::detect(&params.url)?,
    };
    let record = site.parse_url(&params.url)?;

    Ok(ToolCallResult::json(&json!({
        "site": site,
        "record": record,
    })))
}
