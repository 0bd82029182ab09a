//! Math Tools MCP Server
//!
//! Serves the statistics and expression tools over MCP.
//!
//! # Usage
//!
//! ## stdio transport (for desktop clients, local use)
//! ```bash
//! math-tools-mcp
//! ```
//!
//! ## SSE transport (for remote hosting)
//! ```bash
//! math-tools-mcp --transport sse --port 9000
//! ```

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use math_tools_mcp::config::{ServerConfig, Transport, DEFAULT_PORT};
use math_tools_mcp::mcp::{run_sse, McpServer, AVAILABLE_TOOLS};

/// Math Tools MCP Server
#[derive(Parser, Debug)]
#[command(name = "math-tools-mcp")]
#[command(version)]
#[command(about = "MCP server for descriptive statistics and math expressions")]
struct Args {
    /// Transport to serve
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio, env = "MATH_TOOLS_TRANSPORT")]
    transport: Transport,

    /// Host to bind to (sse only)
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "MATH_TOOLS_HOST")]
    host: IpAddr,

    /// Port to listen on (sse only)
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MATH_TOOLS_PORT")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            transport: args.transport,
            host: args.host,
            port: args.port,
            verbose: args.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from(Args::parse());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));

    // stdout carries the protocol for stdio, so logs go to stderr there
    match config.transport {
        Transport::Stdio => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        Transport::Sse => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    let server = McpServer::new();
    tracing::info!("Available tools: {}", AVAILABLE_TOOLS.join(", "));

    match config.transport {
        Transport::Stdio => {
            tracing::info!("Using stdio transport");
            server.run_stdio().await?;
        }
        Transport::Sse => {
            tracing::info!("Using SSE transport on {}", config.bind_addr());
            run_sse(Arc::new(server), config.bind_addr()).await?;
        }
    }

    Ok(())
}
