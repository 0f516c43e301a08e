//! The `initialize` handshake payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MCP_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "navmatch-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "navmatch grades browser-agent navigation on property search sites. \
    Create a verifier with ground-truth URLs, feed it the agent's current URL \
    with verifier_update, and call verifier_compute for the score.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub name: String,
    pub version: String,
}

/// Client side of the handshake. Client capabilities are kept opaque: the
/// server offers no features that depend on them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: PeerInfo,
}

/// `{"listChanged": false}`: the tool set is fixed at build time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    pub logging: serde_json::Map<String, Value>,
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: PeerInfo,
    pub instructions: String,
}

impl InitializeResult {
    /// What this server announces, answering in `protocol_version`.
    pub fn for_version(protocol_version: impl Into<String>) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            capabilities: ServerCapabilities {
                logging: serde_json::Map::new(),
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: PeerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            instructions: INSTRUCTIONS.to_string(),
        }
    }
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self::for_version(MCP_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_accept_any_client_capabilities() {
        let params: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "2025-03-26",
            "capabilities": { "roots": { "listChanged": true }, "sampling": {} },
            "clientInfo": { "name": "harness", "version": "2.1" }
        }))
        .unwrap();
        assert_eq!(params.protocol_version, "2025-03-26");
        assert_eq!(params.client_info.name, "harness");

        let bare: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": { "name": "bare", "version": "0" }
        }))
        .unwrap();
        assert!(bare.capabilities.is_null());
    }

    #[test]
    fn test_announced_capabilities() {
        let wire = serde_json::to_value(InitializeResult::default()).unwrap();
        assert_eq!(wire["protocolVersion"], MCP_VERSION);
        assert_eq!(wire["capabilities"], json!({ "logging": {}, "tools": { "listChanged": false } }));
        assert_eq!(wire["serverInfo"]["name"], SERVER_NAME);
        assert!(wire["instructions"].as_str().unwrap().contains("verifier_compute"));
    }
}
