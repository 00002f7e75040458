//! Transports to the remote tool server.
//!
//! Every transport offers the same surface: open, call a tool, list tools,
//! close. A new transport is a new [`Transport`] variant.

mod http;
mod stdio;

use crate::client::McpToolInfo;
use crate::config::{McpClientConfig, TransportKind};
use crate::content::ToolResponse;
use crate::error::McpError;

use http::HttpTransport;
use stdio::StdioTransport;

pub(crate) enum Transport {
    Http(HttpTransport),
    Stdio(StdioTransport),
}

impl Transport {
    pub(crate) async fn open(config: &McpClientConfig) -> Result<Self, McpError> {
        match config.transport_kind()? {
            TransportKind::Http => Ok(Self::Http(HttpTransport::open(config)?)),
            TransportKind::Stdio => Ok(Self::Stdio(StdioTransport::open(config).await?)),
        }
    }

    pub(crate) async fn call_tool(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<ToolResponse, McpError> {
        match self {
            Self::Http(t) => t.call_tool(tool_name, arguments).await,
            Self::Stdio(t) => t.call_tool(tool_name, arguments).await,
        }
    }

    pub(crate) async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        match self {
            Self::Http(t) => t.list_tools().await,
            Self::Stdio(t) => t.list_tools().await,
        }
    }

    pub(crate) async fn close(self) {
        match self {
            // Dropping the client releases its pooled connections
            Self::Http(_) => {}
            Self::Stdio(t) => t.shutdown().await,
        }
    }
}
