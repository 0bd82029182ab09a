//! Model Context Protocol (MCP) server module
//!
//! This module implements the MCP server for AI agent integration,
//! exposing the statistics and expression tools over stdio or HTTP/SSE.

/// Tool-call interceptors
pub mod middleware;
mod resources;
mod server;
/// HTTP + SSE transport
pub mod sse;
mod tools;
/// MCP protocol types
pub mod types;

pub use middleware::{LoggingMiddleware, ToolMiddleware};
pub use server::McpServer;
pub use sse::{run_sse, SseTransport};
pub use tools::{
    format_number, AddTool, AggregateCalculateTool, MathEvalTool, McpTool, ToolRegistry,
    AVAILABLE_TOOLS,
};
pub use types::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpCapabilities, McpServerInfo,
    McpToolDefinition, ToolCallParams, ToolCallResult, ToolContent,
};
