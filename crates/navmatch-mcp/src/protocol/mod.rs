//! MCP protocol handling: JSON-RPC dispatch and handshake.

pub mod handler;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
