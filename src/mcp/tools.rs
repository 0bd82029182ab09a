//! MCP tool definitions and registry
//!
//! This module defines the available MCP tools and their implementations.
//! The registry is an explicit name -> handler map built at startup and
//! owned by the server that dispatches to it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::expr::{self, CONSTANTS, FUNCTIONS};
use crate::mcp::middleware::{LoggingMiddleware, ToolMiddleware};
use crate::mcp::types::{McpToolDefinition, ToolCallResult};
use crate::stats::{self, Operation};

/// A registered MCP tool
pub trait McpTool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;
    /// Tool description
    fn description(&self) -> &str;
    /// Input schema as JSON
    fn input_schema(&self) -> Value;
    /// Run the tool against raw JSON arguments
    fn call(&self, args: &Value) -> ToolCallResult;
    /// Get tool definition
    fn definition(&self) -> McpToolDefinition {
        McpToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Tool registry holding all available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn McpTool>>,
    middleware: Vec<Arc<dyn ToolMiddleware>>,
}

impl ToolRegistry {
    /// Create a registry with all built-in tools and call logging
    pub fn new() -> Self {
        Self::empty()
            .with_tool(AggregateCalculateTool)
            .with_tool(MathEvalTool)
            .with_tool(AddTool)
            .with_middleware(LoggingMiddleware)
    }

    /// Create a registry with no tools and no middleware
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn McpTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder form of [`ToolRegistry::register`]
    pub fn with_tool(mut self, tool: impl McpTool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    /// Append a middleware to the chain
    pub fn with_middleware(mut self, middleware: impl ToolMiddleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Names of all registered tools, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get all tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<McpToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name
    #[instrument(skip(self, args))]
    pub fn execute(&self, name: &str, args: Value) -> ToolCallResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolCallResult::error(format!("Tool not found: {}", name));
        };

        for mw in &self.middleware {
            mw.before(name, &args);
        }

        let result = tool.call(&args);

        for mw in self.middleware.iter().rev() {
            mw.after(name, &result);
        }

        result
    }
}

/// Decode tool arguments, treating a missing object as `{}`
fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, ToolCallResult> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(args)
        .map_err(|e| ToolCallResult::error(format!("Invalid arguments: {}", e)))
}

/// Render a float the way clients expect a float, e.g. `3.0` not `3`
pub fn format_number(value: f64) -> String {
    format!("{:?}", value)
}

/// JSON has no encoding for NaN or infinity, so those are reported as errors
fn float_result(value: f64) -> ToolCallResult {
    if !value.is_finite() {
        return ToolCallResult::error(format!("result is not a finite number: {}", value));
    }
    ToolCallResult::value(format_number(value), json!(value))
}

// ============================================================================
// Tool Definitions
// ============================================================================

/// Descriptive statistics over a list of numbers
pub struct AggregateCalculateTool;

#[derive(Debug, Deserialize)]
struct AggregateArgs {
    numbers: Vec<f64>,
    op: String,
}

impl McpTool for AggregateCalculateTool {
    fn name(&self) -> &str {
        "aggregate_calculate"
    }

    fn description(&self) -> &str {
        "Compute a descriptive statistic over a list of numbers. \
         Use math_eval for single expressions."
    }

    fn input_schema(&self) -> Value {
        let ops: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "numbers": {
                    "type": "array",
                    "items": { "type": "number" },
                    "description": "Values to aggregate (must not be empty)"
                },
                "op": {
                    "type": "string",
                    "enum": ops,
                    "description": "Statistic to compute"
                }
            },
            "required": ["numbers", "op"]
        })
    }

    fn call(&self, args: &Value) -> ToolCallResult {
        let args: AggregateArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        match stats::aggregate_str(&args.numbers, &args.op) {
            Ok(value) => float_result(value),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }
}

/// Evaluate a math expression string
pub struct MathEvalTool;

#[derive(Debug, Deserialize)]
struct MathEvalArgs {
    expr: String,
}

impl McpTool for MathEvalTool {
    fn name(&self) -> &str {
        "math_eval"
    }

    fn description(&self) -> &str {
        "Evaluate a math expression such as 'sin(pi/2) + log(10) * sqrt(16) / pow(2, 3)'. \
         Supports nested calls to standard math functions and the constants pi, e, tau and inf. \
         Does not compute statistics over lists; use aggregate_calculate for that."
    }

    fn input_schema(&self) -> Value {
        let functions: Vec<&str> = FUNCTIONS.iter().map(|(name, _)| *name).collect();
        let constants: Vec<&str> = CONSTANTS.iter().map(|(name, _)| *name).collect();
        json!({
            "type": "object",
            "properties": {
                "expr": {
                    "type": "string",
                    "description": format!(
                        "Expression to evaluate. Functions: {}. Constants: {}.",
                        functions.join(", "),
                        constants.join(", ")
                    )
                }
            },
            "required": ["expr"]
        })
    }

    fn call(&self, args: &Value) -> ToolCallResult {
        let args: MathEvalArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        match expr::math_eval(&args.expr) {
            Ok(value) => float_result(value),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }
}

/// Add two integers
pub struct AddTool;

#[derive(Debug, Deserialize)]
struct AddArgs {
    a: i64,
    b: i64,
}

impl McpTool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer" },
                "b": { "type": "integer" }
            },
            "required": ["a", "b"]
        })
    }

    fn call(&self, args: &Value) -> ToolCallResult {
        let args: AddArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        match args.a.checked_add(args.b) {
            Some(sum) => ToolCallResult::value(sum.to_string(), json!(sum)),
            None => ToolCallResult::error("integer overflow"),
        }
    }
}

/// List of all available tools (for documentation)
pub const AVAILABLE_TOOLS: &[&str] = &["add", "aggregate_calculate", "math_eval"];
