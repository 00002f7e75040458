//! MCP client owning one connection to the tool server.
//!
//! The connection is opened by `connect` (or lazily by the first call) and
//! released by `close`. Calls on one client are serialized.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::McpClientConfig;
use crate::error::McpError;
use crate::transport::Transport;

pub const DEFAULT_COUNTRY: &str = "Belgium";
pub const DEFAULT_LIMIT: u32 = 10;

/// A tool advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default = "default_schema",
        rename = "inputSchema",
        alias = "input_schema"
    )]
    pub input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// Arguments of the server's `find_prospects` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectQuery {
    pub sector: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl ProspectQuery {
    /// A query for `sector` with the default country and limit.
    pub fn new(sector: impl Into<String>) -> Self {
        Self {
            sector: sector.into(),
            country: default_country(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// The `arguments` object sent with the tool call.
    pub fn to_arguments(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut args = serde_json::Map::new();
        args.insert("sector".into(), self.sector.clone().into());
        args.insert("country".into(), self.country.clone().into());
        args.insert("limit".into(), self.limit.into());
        args
    }
}

/// Client for one remote tool server.
pub struct McpClient {
    config: McpClientConfig,
    /// `None` while disconnected.
    state: Mutex<Option<Transport>>,
}

impl McpClient {
    /// Create a disconnected client. Nothing is contacted until `connect` or
    /// the first call.
    pub fn new(config: McpClientConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &McpClientConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Open the transport. Does nothing if already connected.
    pub async fn connect(&self) -> Result<(), McpError> {
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state).await.map(|_| ())
    }

    /// Release the transport and return to the disconnected state. Safe to
    /// call any number of times.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let Some(transport) = state.take() {
            transport.close().await;
            tracing::info!("MCP client connection closed");
        }
    }

    async fn ensure_connected<'s>(
        &self,
        state: &'s mut Option<Transport>,
    ) -> Result<&'s Transport, McpError> {
        match *state {
            Some(ref transport) => Ok(transport),
            None => {
                let transport = Transport::open(&self.config).await?;
                Ok(&*state.insert(transport))
            }
        }
    }

    /// Call `tool_name` with `arguments` and return its text result.
    ///
    /// Connects first if needed. A call that outlives the configured timeout
    /// fails with [`McpError::Timeout`] and leaves the connection usable.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, McpError> {
        if tool_name.is_empty() {
            return Err(McpError::Config("tool name must not be empty".to_string()));
        }
        let arguments = serde_json::Value::Object(arguments);

        let mut state = self.state.lock().await;
        let transport = self.ensure_connected(&mut state).await?;

        tracing::info!("Calling MCP tool '{tool_name}' with arguments: {arguments}");
        match transport.call_tool(tool_name, &arguments).await {
            Ok(response) => {
                tracing::info!("Successfully called tool '{tool_name}'");
                Ok(response.into_text())
            }
            Err(e) => {
                tracing::error!(
                    "Error calling MCP tool '{tool_name}' with arguments {arguments}: {e}"
                );
                Err(e)
            }
        }
    }

    /// Search for business prospects via the server's `find_prospects` tool.
    pub async fn find_prospects(&self, query: &ProspectQuery) -> Result<String, McpError> {
        self.call_tool("find_prospects", query.to_arguments()).await
    }

    /// The server's tool catalog.
    ///
    /// Unlike `call_tool`, failures are not propagated: they are logged and an
    /// empty list is returned.
    pub async fn list_tools(&self) -> Vec<McpToolInfo> {
        let mut state = self.state.lock().await;
        let transport = match self.ensure_connected(&mut state).await {
            Ok(transport) => transport,
            Err(e) => {
                tracing::error!("Error listing MCP tools: {e}");
                return Vec::new();
            }
        };
        match transport.list_tools().await {
            Ok(tools) => {
                tracing::debug!("MCP server lists {} tools", tools.len());
                tools
            }
            Err(e) => {
                tracing::error!("Error listing MCP tools: {e}");
                Vec::new()
            }
        }
    }
}
