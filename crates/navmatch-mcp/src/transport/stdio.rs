//! Stdio transport: JSON-RPC lines in on stdin, replies out on stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::types::{JsonRpcError, McpError, McpResult, RequestId};

use super::framing;

pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Serve stdin/stdout until EOF.
    pub async fn run(&self) -> McpResult<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        tracing::info!("Stdio transport started");
        self.serve(reader, writer).await
    }

    /// Serve any line-oriented stream pair until the reader hits EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await.map_err(McpError::Io)?;

            if bytes_read == 0 {
                tracing::info!("EOF on input, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let reply = match framing::parse_message(trimmed) {
                Ok(msg) => self.handler.handle_message(msg).await,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    let error_response = JsonRpcError::new(RequestId::Null, e.code(), e.to_string());
                    Some(
                        serde_json::to_value(error_response)
                            .map_err(|e| McpError::InternalError(e.to_string()))?,
                    )
                }
            };

            if let Some(value) = reply {
                let framed = framing::frame_message(&value)?;
                writer
                    .write_all(framed.as_bytes())
                    .await
                    .map_err(McpError::Io)?;
                writer.flush().await.map_err(McpError::Io)?;
            }
        }

        Ok(())
    }
}
