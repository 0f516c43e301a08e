//! Verifier session management.

pub mod manager;

pub use manager::{VerifierEntry, VerifierSessionManager, VerifierSummary};
