//! Payloads of `tools/list` and `tools/call`.
//!
//! Every verifier tool answers with a single text block holding pretty JSON,
//! so the content model only carries text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{McpError, McpResult};

/// `tools/call` params. Missing `arguments` means an empty object.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl ToolCall {
    pub fn arguments_or_empty(self) -> (String, Value) {
        let args = self
            .arguments
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        (self.name, args)
    }
}

/// Decode a tool's arguments object into its typed params.
pub fn arguments<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    /// Pretty-printed JSON of `value` as the only content block.
    pub fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::text(format!("{{\"error\": \"{e}\"}}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// `tools/list` result. The catalogue is small and never paginated.
#[derive(Debug, Clone, Serialize)]
pub struct ToolList {
    pub tools: Vec<ToolDefinition>,
}
