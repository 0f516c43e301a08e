//! MCP tool implementations.

pub mod registry;
pub mod url_match;
pub mod url_parse;
pub mod verifier_close;
pub mod verifier_compute;
pub mod verifier_create;
pub mod verifier_list;
pub mod verifier_reset;
pub mod verifier_update;

pub use registry::ToolRegistry;
