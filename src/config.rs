//! Server configuration
//!
//! Resolved once at startup from the command line (with `MATH_TOOLS_*`
//! environment fallbacks) and handed to the chosen transport.

use std::net::{IpAddr, SocketAddr};

use clap::ValueEnum;

/// Default SSE port
pub const DEFAULT_PORT: u16 = 9000;

/// Default SSE bind address
pub const DEFAULT_HOST: [u8; 4] = [0, 0, 0, 0];

/// Transport the server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// HTTP with server-sent events
    Sse,
}

/// Resolved server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Selected transport
    pub transport: Transport,
    /// Bind address (SSE only)
    pub host: IpAddr,
    /// Bind port (SSE only)
    pub port: u16,
    /// Verbose logging
    pub verbose: bool,
}

impl ServerConfig {
    /// Socket address the SSE transport binds to
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "math_tools_mcp=debug,tower_http=debug"
        } else {
            "math_tools_mcp=info"
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: IpAddr::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            verbose: false,
        }
    }
}
