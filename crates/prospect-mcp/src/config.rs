//! Client configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::McpError;

pub const DEFAULT_TRANSPORT: &str = "sse";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

fn default_transport() -> String {
    DEFAULT_TRANSPORT.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// How the client reaches the tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request/response over HTTP (`sse`, `http`, `streamable-http`).
    Http,
    /// JSON-RPC over the stdin/stdout of a spawned process.
    Stdio,
}

impl FromStr for TransportKind {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sse" | "http" | "streamable-http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            _ => Err(McpError::UnsupportedTransport(s.to_string())),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Stdio => f.write_str("stdio"),
        }
    }
}

/// Configuration for one [`McpClient`](crate::McpClient). Fixed once the client is built.
///
/// `transport` stays a string until `connect`, so an unknown kind coming from
/// the environment or a config file is reported as
/// [`McpError::UnsupportedTransport`] at connect time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpClientConfig {
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Server host (HTTP transport).
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (HTTP transport).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shell command line that starts the server (stdio transport).
    #[serde(default)]
    pub command: Option<String>,
    /// Extra environment variables for the spawned server.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Per-request timeout in milliseconds (default: 30000).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            host: default_host(),
            port: default_port(),
            command: None,
            env: HashMap::new(),
            timeout_ms: default_timeout(),
        }
    }
}

impl McpClientConfig {
    /// An HTTP client configuration for `http://{host}:{port}`.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: "http".to_string(),
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// A stdio client configuration that spawns `command`.
    pub fn stdio(command: impl Into<String>) -> Self {
        Self {
            transport: "stdio".to_string(),
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn transport_kind(&self) -> Result<TransportKind, McpError> {
        self.transport.parse()
    }

    /// Human-readable target for log lines: the base URL or the spawn command.
    pub fn target(&self) -> String {
        match self.transport_kind() {
            Ok(TransportKind::Stdio) => self.command.clone().unwrap_or_default(),
            _ => self.base_url(),
        }
    }
}
