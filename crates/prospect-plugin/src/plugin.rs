//! The ProspectFinder plugin.

use std::sync::Arc;

use prospect_mcp::{McpClient, McpClientConfig, McpToolInfo, ProspectQuery};
use prospect_types::{
    AgentHandle, BoxFuture, MessageContext, Plugin, PluginError, ToolFunctions,
};
use tokio::sync::RwLock;

use crate::functions;
use crate::triggers::is_prospect_request;

/// Registration name of the plugin.
pub const PLUGIN_NAME: &str = "prospectfinder";

const DESCRIPTION: &str = "Provides business prospect finding capabilities via MCP server. \
     Can search for companies in specific sectors and countries.";

/// Plugin that finds business prospects through the ProspectFinder MCP server.
///
/// Cloning is cheap and clones share the same connection; the exported tool
/// functions hold such a clone.
///
/// ```no_run
/// # async fn demo() -> Result<(), prospect_types::PluginError> {
/// use prospect_plugin::{McpClientConfig, ProspectFinderPlugin, ProspectQuery};
/// use prospect_types::{AgentHandle, Plugin};
///
/// let plugin = ProspectFinderPlugin::new(McpClientConfig::http("localhost", 8000));
/// plugin.on_agent_start(&AgentHandle::new("ProspectAgent")).await?;
/// let prospects = plugin
///     .find_prospects(&ProspectQuery::new("Marketing").limit(5))
///     .await?;
/// println!("{prospects}");
/// plugin.cleanup().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProspectFinderPlugin {
    config: McpClientConfig,
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    client: RwLock<Option<Arc<McpClient>>>,
    agent: RwLock<Option<AgentHandle>>,
}

impl ProspectFinderPlugin {
    pub fn new(config: McpClientConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Inner::default()),
        }
    }

    /// The configuration the client is built from on start.
    pub fn config(&self) -> &McpClientConfig {
        &self.config
    }

    /// The agent this plugin was started for.
    pub async fn agent(&self) -> Option<AgentHandle> {
        self.inner.agent.read().await.clone()
    }

    /// Whether `on_agent_start` has run, successfully or not.
    pub async fn is_started(&self) -> bool {
        self.inner.client.read().await.is_some()
    }

    /// Build the client and connect it.
    ///
    /// The client is kept even if the connection fails; the next domain call
    /// retries the connection.
    pub async fn start(&self, agent: &AgentHandle) -> Result<(), PluginError> {
        *self.inner.agent.write().await = Some(agent.clone());

        let client = Arc::new(McpClient::new(self.config.clone()));
        let previous = self.inner.client.write().await.replace(Arc::clone(&client));
        if let Some(previous) = previous {
            previous.close().await;
        }

        if let Err(e) = client.connect().await {
            tracing::error!("Failed to connect to MCP server: {e}");
            return Err(PluginError::Start {
                plugin: PLUGIN_NAME.to_string(),
                source: Box::new(e),
            });
        }
        tracing::info!(
            "ProspectFinder plugin connected to MCP server at {}",
            self.config.target()
        );
        Ok(())
    }

    /// Close the client's connection, if any. The client itself is kept, so a
    /// later domain call reconnects.
    pub async fn stop(&self) {
        let client = self.inner.client.read().await.clone();
        if let Some(client) = client {
            client.close().await;
            tracing::info!("ProspectFinder plugin disconnected from MCP server");
        }
    }

    async fn client(&self) -> Result<Arc<McpClient>, PluginError> {
        self.inner
            .client
            .read()
            .await
            .clone()
            .ok_or_else(|| PluginError::NotInitialized {
                plugin: PLUGIN_NAME.to_string(),
            })
    }

    /// Search for business prospects.
    ///
    /// Client errors are passed through; the original [`prospect_mcp::McpError`]
    /// is reachable with [`PluginError::downcast_ref`].
    pub async fn find_prospects(&self, query: &ProspectQuery) -> Result<String, PluginError> {
        let client = self.client().await?;

        tracing::info!(
            "Searching for prospects: sector={}, country={}, limit={}",
            query.sector,
            query.country,
            query.limit
        );
        match client.find_prospects(query).await {
            Ok(results) => {
                tracing::info!(
                    "Successfully retrieved prospects for {} in {}",
                    query.sector,
                    query.country
                );
                Ok(results)
            }
            Err(e) => {
                tracing::error!("Error finding prospects: {e}");
                Err(PluginError::tool(e))
            }
        }
    }

    /// The tools the MCP server offers. Empty if the server cannot list them.
    pub async fn list_available_tools(&self) -> Result<Vec<McpToolInfo>, PluginError> {
        Ok(self.client().await?.list_tools().await)
    }
}

impl Plugin for ProspectFinderPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn on_agent_start<'a>(
        &'a self,
        agent: &'a AgentHandle,
    ) -> BoxFuture<'a, Result<(), PluginError>> {
        Box::pin(self.start(agent))
    }

    /// Only observes: a prospect-looking message is logged, and every message
    /// is returned unchanged.
    fn on_message_received<'a>(
        &'a self,
        message: String,
        _ctx: &'a MessageContext,
    ) -> BoxFuture<'a, String> {
        Box::pin(async move {
            if is_prospect_request(&message) {
                tracing::info!("Detected potential prospect search request");
            }
            message
        })
    }

    fn cleanup(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.stop())
    }

    fn tool_functions(&self) -> ToolFunctions {
        functions::export(self)
    }
}
