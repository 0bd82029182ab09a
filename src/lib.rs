//! Math Tools MCP - statistics and expression evaluation for AI agents
//!
//! This crate provides an MCP (Model Context Protocol) server exposing a
//! descriptive-statistics aggregator and a math-expression evaluator as
//! remotely callable tools.
//!
//! # Features
//!
//! - **Statistics**: mean, median, quartiles, variance, skew and more via [`stats`]
//! - **Expressions**: closed-namespace math evaluation via [`expr`]
//! - **Transports**: newline-delimited stdio and HTTP/SSE
//!
//! # Architecture
//!
//! ```text
//! AI Agent ──▶ stdio / SSE ──▶ McpServer ──▶ ToolRegistry ──▶ middleware
//!                                                 │
//!                                    ┌────────────┼────────────┐
//!                                    ▼            ▼            ▼
//!                            aggregate_calculate  math_eval    add
//!                                    │            │
//!                                    ▼            ▼
//!                              stats::aggregate  expr::math_eval
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use math_tools_mcp::mcp::ToolRegistry;
//! use serde_json::json;
//!
//! let registry = ToolRegistry::new();
//! let result = registry.execute(
//!     "aggregate_calculate",
//!     json!({ "numbers": [1, 2, 3, 4, 5], "op": "median" }),
//! );
//! assert_eq!(result.first_text(), Some("3.0"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod expr;
pub mod mcp;
pub mod stats;

// Re-exports for convenience
pub use config::{ServerConfig, Transport};
pub use error::{Error, ExprError, McpError, Result, StatsError};
pub use expr::math_eval;
pub use mcp::{McpServer, McpTool, ToolRegistry};
pub use stats::{aggregate, Operation};
