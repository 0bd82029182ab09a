//! MCP server implementation
//!
//! This module implements the JSON-RPC dispatch shared by every transport,
//! plus the stdio transport: newline-delimited JSON-RPC messages on stdin,
//! responses on stdout. Logging must go to stderr while this transport runs.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Error, McpError, Result};
use crate::mcp::resources;
use crate::mcp::tools::ToolRegistry;
use crate::mcp::types::{
    JsonRpcRequest, JsonRpcResponse, McpCapabilities, McpServerInfo, ReadResourceParams,
    ToolCallParams, PROTOCOL_VERSION,
};

/// MCP server state
///
/// Holds no per-client state, so one instance can be shared by every SSE
/// session.
pub struct McpServer {
    /// Tool registry
    tools: ToolRegistry,
    /// Server info
    info: McpServerInfo,
}

impl McpServer {
    /// Create a new MCP server with the built-in tools
    pub fn new() -> Self {
        Self::with_registry(ToolRegistry::new())
    }

    /// Create a server dispatching to the given registry
    pub fn with_registry(tools: ToolRegistry) -> Self {
        Self {
            tools,
            info: McpServerInfo::default(),
        }
    }

    /// Server name and version
    pub fn info(&self) -> &McpServerInfo {
        &self.info
    }

    /// Run the stdio transport until stdin closes
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`
    #[instrument(skip_all)]
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(
            "Starting MCP server: {} v{}",
            self.info.name, self.info.version
        );

        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(l)) => l,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read line: {}", e);
                    return Err(e.into());
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            if let Some(resp) = self.handle_line(&line).await {
                let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
                    error!("Failed to serialize response: {}", e);
                    r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"}}"#
                        .to_string()
                });

                debug!("Sending: {}", json);

                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle a single serialized message
    ///
    /// Text that is not JSON is a parse error (-32700); JSON that is not a
    /// request object is an invalid request (-32600), answered with the
    /// message's `id` when one can be recovered.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::parse_error());
            }
        };

        let id = message.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(r) => r,
            Err(e) => {
                warn!("Invalid request: {}", e);
                return Some(JsonRpcResponse::invalid_request(id));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a JSON-RPC request. Notifications yield `None`.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let notification = request.is_notification();

        if request.jsonrpc != "2.0" {
            warn!("Unsupported JSON-RPC version: {}", request.jsonrpc);
            return (!notification).then(|| JsonRpcResponse::invalid_request(id));
        }

        debug!("Handling method");

        let result = match request.method.as_str() {
            // Lifecycle methods
            "initialize" => self.handle_initialize(request.params),
            "initialized" | "notifications/initialized" => {
                debug!("Client finished initialization");
                Ok(Value::Null)
            }
            "shutdown" => {
                info!("Handling shutdown");
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),

            // Tool methods
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params),

            // Resource methods
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(json!({
                "resourceTemplates": resources::templates()
            })),
            "resources/read" => self.handle_resources_read(request.params),

            method => {
                if notification {
                    debug!("Ignoring notification: {}", method);
                    return None;
                }
                warn!("Unknown method: {}", method);
                return Some(JsonRpcResponse::method_not_found(id, method));
            }
        };

        if notification {
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(Error::Mcp(e @ McpError::InvalidParams(_)))
            | Err(Error::Mcp(e @ McpError::ResourceNotFound(_))) => {
                JsonRpcResponse::invalid_params(id, &e.to_string())
            }
            Err(e) => JsonRpcResponse::internal_error(id, &e.to_string()),
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        if let Some(version) = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
        {
            debug!("Client protocol version: {}", version);
        }

        info!("Client initialized");

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": McpCapabilities::default(),
            "serverInfo": self.info
        }))
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Result<Value> {
        Ok(json!({
            "tools": self.tools.definitions()
        }))
    }

    /// Handle tools/call request
    fn handle_tools_call(&self, params: Option<Value>) -> Result<Value> {
        let tool_params: ToolCallParams = decode_params(params)?;
        let result = self.tools.execute(&tool_params.name, tool_params.arguments);
        Ok(serde_json::to_value(result)?)
    }

    /// Handle resources/read request
    fn handle_resources_read(&self, params: Option<Value>) -> Result<Value> {
        let read: ReadResourceParams = decode_params(params)?;
        let contents = resources::read(&read.uri)?;
        Ok(json!({ "contents": [contents] }))
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()).into())
}
