//! navmatch MCP server: verifier sessions exposed as MCP tools, plus the
//! batch self-match check used by the CLI.

pub mod check;
pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use check::{run_check, CheckSummary};
pub use config::{load_tasks, resolve_tasks_path, ServerConfig, TaskSpec};
pub use protocol::ProtocolHandler;
pub use session::VerifierSessionManager;
pub use transport::StdioTransport;
