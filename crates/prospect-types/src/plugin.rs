//! Plugin trait consumed by the agent host.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::PluginError;
use crate::tool::ToolFunctions;

/// A boxed, sendable future. Keeps the host traits dyn-compatible.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The agent a plugin is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHandle {
    name: String,
    model: Option<String>,
}

impl AgentHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// Extra information the host passes alongside an inbound message.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub session_id: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A named, versioned capability that the host attaches to an agent.
///
/// Hooks are invoked by the host in this order: `on_agent_start` once, then any
/// number of `on_message_received` calls and exported tool invocations, then
/// `cleanup` on shutdown.
pub trait Plugin: Send + Sync {
    /// Stable token used for registration and discovery.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Semantic version string.
    fn version(&self) -> &str;

    /// Called once when the owning agent starts.
    ///
    /// An error here is a fatal start error for this plugin; whether the agent
    /// keeps running without it is the host's decision.
    fn on_agent_start<'a>(&'a self, agent: &'a AgentHandle)
    -> BoxFuture<'a, Result<(), PluginError>>;

    /// Called for every inbound user message before model processing.
    /// Returns the message the host should continue with.
    fn on_message_received<'a>(
        &'a self,
        message: String,
        _ctx: &'a MessageContext,
    ) -> BoxFuture<'a, String> {
        Box::pin(async move { message })
    }

    /// Release any resources acquired in `on_agent_start`.
    fn cleanup(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }

    /// Functions the host may register as model-invokable tools.
    fn tool_functions(&self) -> ToolFunctions {
        ToolFunctions::new()
    }
}
