//! Error types for MCP operations.

use thiserror::Error;

/// Errors from talking to the remote tool server.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid MCP client configuration: {0}")]
    Config(String),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    #[error("Failed to spawn MCP server '{command}': {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("Failed to connect to MCP server at {target}: {source}")]
    Connection {
        target: String,
        source: reqwest::Error,
    },

    #[error("MCP tool '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    #[error("JSON-RPC error from '{server}' (code {code}): {message}")]
    JsonRpc {
        server: String,
        code: i64,
        message: String,
    },

    #[error("MCP tool '{tool}' reported an error: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("MCP server returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Whether this error came from the call exceeding its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
