//! Capability negotiation during `initialize`.

use serde_json::Value;

use crate::types::{InitializeParams, InitializeResult, McpResult, MCP_VERSION};

/// Protocol revisions the server answers in kind. Anything else gets `MCP_VERSION`.
pub const SUPPORTED_VERSIONS: &[&str] = &[MCP_VERSION, "2025-03-26", "2025-06-18"];

/// Client state recorded after negotiation.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: Value,
    pub client_name: Option<String>,
    pub protocol_version: Option<String>,
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    pub fn negotiate(&mut self, params: InitializeParams) -> McpResult<InitializeResult> {
        let version = if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version.clone()
        } else {
            tracing::warn!(
                "Client requested protocol version {}, answering with {MCP_VERSION}",
                params.protocol_version
            );
            MCP_VERSION.to_string()
        };

        tracing::info!(
            "Initialized with client: {} v{} (protocol {version})",
            params.client_info.name,
            params.client_info.version
        );

        self.client = params.capabilities;
        self.client_name = Some(params.client_info.name);
        self.protocol_version = Some(version.clone());

        Ok(InitializeResult::for_version(version))
    }

    pub fn mark_initialized(&mut self) -> McpResult<()> {
        if self.protocol_version.is_none() {
            tracing::warn!("Got initialized notification before initialize");
        }
        self.initialized = true;
        tracing::info!("MCP handshake complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PeerInfo;

    fn params(version: &str) -> InitializeParams {
        InitializeParams {
            protocol_version: version.to_string(),
            capabilities: Value::Null,
            client_info: PeerInfo {
                name: "harness".to_string(),
                version: "1.0".to_string(),
            },
        }
    }

    #[test]
    fn test_supported_version_echoed() {
        let mut caps = NegotiatedCapabilities::default();
        let result = caps.negotiate(params("2025-03-26")).unwrap();
        assert_eq!(result.protocol_version, "2025-03-26");
        assert_eq!(caps.client_name.as_deref(), Some("harness"));
    }

    #[test]
    fn test_unknown_version_falls_back() {
        let mut caps = NegotiatedCapabilities::default();
        let result = caps.negotiate(params("1999-01-01")).unwrap();
        assert_eq!(result.protocol_version, MCP_VERSION);
        assert!(!caps.initialized);
        caps.mark_initialized().unwrap();
        assert!(caps.initialized);
    }
}
