//! MCP protocol types
//!
//! This module defines the types used in the MCP JSON-RPC protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision implemented by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Optional parameters
    #[serde(default)]
    pub params: Option<Value>,
    /// Request ID (None for notifications)
    #[serde(default)]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request with the given id
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    /// Whether this message expects no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Success result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Create a parse error response
    pub fn parse_error() -> Self {
        Self::error(None, PARSE_ERROR, "Parse error")
    }

    /// Create an invalid request error
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, INVALID_REQUEST, "Invalid Request")
    }

    /// Create a method not found error
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    /// Create an invalid params error
    pub fn invalid_params(id: Option<Value>, msg: &str) -> Self {
        Self::error(id, INVALID_PARAMS, format!("Invalid params: {}", msg))
    }

    /// Create an internal error
    pub fn internal_error(id: Option<Value>, msg: &str) -> Self {
        Self::error(id, INTERNAL_ERROR, format!("Internal error: {}", msg))
    }
}

/// Invalid JSON was received
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Optional additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpCapabilities {
    /// Tools capability
    #[serde(default)]
    pub tools: ToolsCapability,
    /// Resources capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
}

impl Default for McpCapabilities {
    fn default() -> Self {
        Self {
            tools: ToolsCapability::default(),
            resources: Some(ResourcesCapability::default()),
        }
    }
}

/// Tools capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    /// Whether tool list changes should be notified
    #[serde(default, rename = "listChanged")]
    pub list_changed: bool,
}

/// Resources capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesCapability {
    /// Whether clients may subscribe to resource updates
    #[serde(default)]
    pub subscribe: bool,
    /// Whether resource list changes should be notified
    #[serde(default, rename = "listChanged")]
    pub list_changed: bool,
}

/// MCP server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl Default for McpServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MCP tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Input JSON schema
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for tools/call method
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Tool name
    pub name: String,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Value,
}

/// Result of a tool call
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Whether the call was an error
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    /// Content array
    pub content: Vec<ToolContent>,
    /// Machine-readable result
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl ToolCallResult {
    /// Create a success result with text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::text(text)],
            structured_content: None,
        }
    }

    /// Create a success result carrying a single value as
    /// `{"result": value}` alongside its text rendering
    pub fn value(text: impl Into<String>, value: Value) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::text(text)],
            structured_content: Some(serde_json::json!({ "result": value })),
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ToolContent::text(message)],
            structured_content: None,
        }
    }

    /// Text of the first content item, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
        })
    }
}

/// Content item in tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },
}

impl ToolContent {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Parameterized resource advertised via resources/templates/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTemplate {
    /// RFC 6570 URI template
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    /// Human-readable name
    pub name: String,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the rendered resource
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Parameters for resources/read method
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    /// Resource URI
    pub uri: String,
}

/// One resource body returned from resources/read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContents {
    /// Resource URI
    pub uri: String,
    /// MIME type
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Text body
    pub text: String,
}
