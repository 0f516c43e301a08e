//! Wire types: JSON-RPC envelopes, the handshake, tool payloads and errors.

pub mod error;
pub mod initialize;
pub mod message;
pub mod tool;

pub use error::*;
pub use initialize::*;
pub use message::*;
pub use tool::*;
