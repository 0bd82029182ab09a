//! Dynamic MCP resources
//!
//! Only one resource family is served: `greeting://{name}`, rendered with the
//! current local time on every read.

use chrono::Local;

use crate::error::McpError;
use crate::mcp::types::{ResourceContents, ResourceTemplate};

const GREETING_SCHEME: &str = "greeting://";

/// Templates advertised via resources/templates/list
pub fn templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: format!("{}{{name}}", GREETING_SCHEME),
        name: "greeting".to_string(),
        description: Some("Personalized greeting with the current time".to_string()),
        mime_type: Some("text/plain".to_string()),
    }]
}

/// Resolve a resource URI to its contents
pub fn read(uri: &str) -> Result<ResourceContents, McpError> {
    let name = uri
        .strip_prefix(GREETING_SCHEME)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;

    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: "text/plain".to_string(),
        text: greeting(name),
    })
}

fn greeting(name: &str) -> String {
    format!(
        "👋 Hello {}! Current time: {}",
        name,
        Local::now().format("%Y-%m-%d %H:%M:%S%.6f")
    )
}
