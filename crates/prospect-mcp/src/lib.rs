//! MCP (Model Context Protocol) client for the ProspectFinder tool server.
//!
//! A single [`McpClient`] owns at most one connection to a remote tool server,
//! reached either over HTTP (`POST /call_tool`, `GET /tools`) or by spawning
//! the server as a child process and speaking newline-delimited JSON-RPC 2.0
//! over its stdin/stdout. Either way, a tool call comes back as plain text.

pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod jsonrpc;
mod transport;

pub use client::{DEFAULT_COUNTRY, DEFAULT_LIMIT, McpClient, McpToolInfo, ProspectQuery};
pub use config::{McpClientConfig, TransportKind};
pub use content::{ToolContent, ToolResponse};
pub use error::McpError;
