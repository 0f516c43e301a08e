//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::VerifierSessionManager;
use crate::types::{McpError, McpResult, ToolCall, ToolCallResult, ToolDefinition};

use super::{
    url_match, url_parse, verifier_close, verifier_compute, verifier_create, verifier_list,
    verifier_reset, verifier_update,
};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            verifier_create::definition(),
            verifier_update::definition(),
            verifier_reset::definition(),
            verifier_compute::definition(),
            verifier_close::definition(),
            verifier_list::definition(),
            url_match::definition(),
            url_parse::definition(),
        ]
    }

    pub async fn call(
        call: ToolCall,
        session: &Arc<Mutex<VerifierSessionManager>>,
    ) -> McpResult<ToolCallResult> {
        let (name, args) = call.arguments_or_empty();

        match name.as_str() {
            "verifier_create" => verifier_create::execute(args, session).await,
            "verifier_update" => verifier_update::execute(args, session).await,
            "verifier_reset" => verifier_reset::execute(args, session).await,
            "verifier_compute" => verifier_compute::execute(args, session).await,
            "verifier_close" => verifier_close::execute(args, session).await,
            "verifier_list" => verifier_list::execute(args, session).await,
            "url_match" => url_match::execute(args).await,
            "url_parse" => url_parse::execute(args).await,
            other => Err(McpError::ToolNotFound(other.to_string())),
        }
    }
}
