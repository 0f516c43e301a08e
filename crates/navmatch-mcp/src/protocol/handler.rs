//! Routes JSON-RPC traffic for the verifier server.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::session::VerifierSessionManager;
use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// Request methods the server answers. Everything else is `MethodNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Initialize,
    Ping,
    Shutdown,
    ToolsList,
    ToolsCall,
}

impl Method {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "initialize" => Method::Initialize,
            "ping" => Method::Ping,
            "shutdown" => Method::Shutdown,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            _ => return None,
        })
    }
}

/// Decode required request params.
fn params<T: DeserializeOwned>(params: Option<Value>, method: &str) -> McpResult<T> {
    let value =
        params.ok_or_else(|| McpError::InvalidParams(format!("{method} requires params")))?;
    serde_json::from_value(value).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn to_result(value: impl Serialize) -> McpResult<Value> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn empty() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Answers requests against one shared verifier session manager.
pub struct ProtocolHandler {
    session: Arc<Mutex<VerifierSessionManager>>,
    handshake: Mutex<NegotiatedCapabilities>,
}

impl ProtocolHandler {
    pub fn new(session: Arc<Mutex<VerifierSessionManager>>) -> Self {
        Self {
            session,
            handshake: Mutex::new(NegotiatedCapabilities::default()),
        }
    }

    /// Handle one message. Notifications and stray responses yield `None`.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(&notif.method).await;
                None
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => {
                tracing::warn!("Ignoring response or error sent by client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        let id = request.id.clone();
        let method = request.method.clone();
        tracing::debug!("-> {method} ({id})");

        let outcome = match validate_request(&request) {
            Ok(()) => self.dispatch(request).await,
            Err(e) => Err(e),
        };

        let reply = match outcome {
            Ok(result) => serde_json::to_value(JsonRpcResponse::new(id, result)),
            Err(e) => {
                tracing::debug!("<- {method} failed: {e}");
                serde_json::to_value(e.to_json_rpc_error(id))
            }
        };
        reply.unwrap_or_default()
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> McpResult<Value> {
        let method = Method::parse(&request.method)
            .ok_or_else(|| McpError::MethodNotFound(request.method.clone()))?;

        match method {
            Method::Initialize => {
                let init: InitializeParams = params(request.params, "initialize")?;
                let result = self.handshake.lock().await.negotiate(init)?;
                to_result(result)
            }
            Method::Ping => Ok(empty()),
            Method::Shutdown => {
                let live = self.session.lock().await.count();
                tracing::info!("Shutdown requested with {live} live verifiers");
                Ok(empty())
            }
            Method::ToolsList => to_result(ToolList {
                tools: ToolRegistry::list_tools(),
            }),
            Method::ToolsCall => {
                let call: ToolCall = params(request.params, "tools/call")?;
                tracing::debug!("tool call: {}", call.name);
                to_result(ToolRegistry::call(call, &self.session).await?)
            }
        }
    }

    async fn handle_notification(&self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                if let Err(e) = self.handshake.lock().await.mark_initialized() {
                    tracing::error!("Failed to mark initialized: {e}");
                }
            }
            // Tool calls finish under the session lock; there is never one in flight to cancel.
            "notifications/cancelled" | "$/cancelRequest" => {
                tracing::info!("Received cancellation notification");
            }
            other => tracing::debug!("Unknown notification: {other}"),
        }
    }
}
