//! JSON-RPC server loop
//!
//! Reads one JSON-RPC message per line and writes one response per line for
//! every request. Notifications are handled silently.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::protocol::{
    methods, InitializeResult, McpRequest, McpResponse, McpRpcError, RequestId, ServerInfo,
    ToolCallParams, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::tools::WorkbookTools;

/// MCP server state
pub struct McpServer {
    settings: Settings,
    tools: Arc<WorkbookTools>,
}

impl McpServer {
    pub fn new(settings: Settings) -> Self {
        let tools = Arc::new(WorkbookTools::new(settings.read));
        Self { settings, tools }
    }

    /// Serve requests from `reader` until it reaches end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let encoded = serde_json::to_string(&response)?;
                writer.write_all(encoded.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw line, returning the response to write, if any
    pub async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparsable message");
                return Some(McpResponse::error(
                    None,
                    McpRpcError::parse_error().with_data(json!(e.to_string())),
                ));
            }
        };

        // Keep the id, when readable, for the invalid-request reply
        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

        let request: McpRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed request");
                return Some(McpResponse::error(
                    id,
                    McpRpcError::invalid_request().with_data(json!(e.to_string())),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(McpResponse::error(
                request.id,
                McpRpcError::invalid_request()
                    .with_data(json!(format!("Unsupported jsonrpc version {}", request.jsonrpc))),
            ));
        }

        self.handle_request(request).await
    }

    /// Dispatch a decoded request; notifications yield `None`
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        debug!(id = %id, method = %request.method, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.initialize(),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => Ok(json!({ "tools": self.tools.definitions() })),
            methods::TOOLS_CALL => self.call_tool(request.params).await,
            other => Err(McpRpcError::method_not_found().with_data(json!(other))),
        };

        Some(match result {
            Ok(value) => McpResponse::success(Some(id), value),
            Err(err) => {
                debug!(id = %id, error = %err, "Request failed");
                McpResponse::error(Some(id), err)
            }
        })
    }

    fn handle_notification(&self, request: &McpRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => info!("Client initialized"),
            methods::CANCELLED => debug!("Cancellation ignored; calls run to completion"),
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    fn initialize(&self) -> Result<Value, McpRpcError> {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION,
            capabilities: json!({ "tools": {} }),
            server_info: ServerInfo {
                name: self.settings.server.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result)
            .map_err(|e| McpRpcError::internal_error().with_data(json!(e.to_string())))
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, McpRpcError> {
        let params: ToolCallParams = params
            .ok_or_else(|| McpRpcError::invalid_params().with_data(json!("missing params")))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| McpRpcError::invalid_params().with_data(json!(e.to_string())))
            })?;

        let tools = Arc::clone(&self.tools);
        let name = params.name.clone();
        let result = tokio::task::spawn_blocking(move || tools.call(&params.name, params.arguments))
            .await
            .map_err(|e| {
                error!(tool = %name, error = %e, "Tool task failed");
                McpRpcError::internal_error().with_data(json!(e.to_string()))
            })??;

        if result.is_error {
            debug!(tool = %name, "Tool returned an error payload");
        }

        serde_json::to_value(result)
            .map_err(|e| McpRpcError::internal_error().with_data(json!(e.to_string())))
    }
}

/// Run the server on stdin/stdout
pub async fn run_server(settings: Settings) -> std::io::Result<()> {
    info!(
        "Starting {} MCP server v{}",
        settings.server.name,
        env!("CARGO_PKG_VERSION")
    );

    let server = McpServer::new(settings);
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    server.serve(stdin, stdout).await
}
