//! Interceptors composed around tool invocation
//!
//! Cross-cutting concerns live here instead of inside individual tools.
//! The registry calls every middleware's [`ToolMiddleware::before`] in
//! registration order, runs the tool, then calls [`ToolMiddleware::after`]
//! in reverse order.

use serde_json::Value;
use tracing::{info, warn};

use crate::mcp::types::ToolCallResult;

/// Hook pair wrapped around each tool call
pub trait ToolMiddleware: Send + Sync {
    /// Called with the raw arguments before the tool runs
    fn before(&self, _tool: &str, _args: &Value) {}

    /// Called with the outcome after the tool returns
    fn after(&self, _tool: &str, _result: &ToolCallResult) {}
}

/// Logs arguments and results of every tool call
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl ToolMiddleware for LoggingMiddleware {
    fn before(&self, tool: &str, args: &Value) {
        info!(tool, %args, "tool call");
    }

    fn after(&self, tool: &str, result: &ToolCallResult) {
        let output = result.first_text().unwrap_or_default();
        if result.is_error {
            warn!(tool, output, "tool call failed");
        } else {
            info!(tool, output, "tool result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_logging_middleware_accepts_any_outcome() {
        let mw = LoggingMiddleware;
        mw.before("math_eval", &json!({ "expr": "1 + 1" }));
        mw.after("math_eval", &ToolCallResult::value("2.0", json!(2.0)));
        mw.after("math_eval", &ToolCallResult::error("boom"));
    }
}
