//! Error types for the math tools server
//!
//! This module provides the error hierarchy using `thiserror`. Tool-level
//! failures (`StatsError`, `ExprError`) never leave the tool: they are
//! rendered into `isError` tool results. Protocol failures (`McpError`) and
//! transport I/O end up in [`Error`] and become JSON-RPC error responses.

use thiserror::Error;

/// The main error type for math tools operations
#[derive(Error, Debug)]
pub enum Error {
    /// MCP protocol errors
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Descriptive statistics errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// The input list had no elements
    #[error("input list must not be empty")]
    EmptyInput,

    /// The operation code is not one of the supported tags
    #[error("unsupported aggregation operation: {0}")]
    UnsupportedOperation(String),

    /// `mode` was requested but the most frequent value is ambiguous
    #[error("no unique mode")]
    NoUniqueMode,

    /// The statistic of finite inputs does not fit in an `f64`
    #[error("result out of range")]
    OutOfRange,
}

/// Math expression evaluation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Blank expression
    #[error("expression is empty")]
    Empty,

    /// Malformed expression
    #[error("invalid expression syntax: {0}")]
    Parse(String),

    /// Name outside the permitted function/constant table
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// Function called with the wrong number of arguments
    #[error("function '{name}' called with wrong number of arguments: {detail}")]
    Arity {
        /// Function name
        name: String,
        /// Description of the mismatch
        detail: String,
    },

    /// Result is not a number (e.g. `sqrt(-1)`, `log(0)`)
    #[error("math domain error")]
    Domain,

    /// Division or modulo by zero
    #[error("float division by zero")]
    DivisionByZero,

    /// Finite operands produced an infinite result (e.g. `exp(1000)`)
    #[error("math range error")]
    Range,
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Resource URI not served by this server
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

/// Result type alias for math tools operations
pub type Result<T> = std::result::Result<T, Error>;
