//! Tool functions a plugin exports to the host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::PluginError;
use crate::plugin::BoxFuture;

/// Name, description and JSON input schema the host advertises to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A callable exported by a plugin.
///
/// The host hands the model's JSON arguments to `call` and feeds the returned
/// text back into the conversation.
pub trait ToolFunction: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn call(&self, arguments: serde_json::Value) -> BoxFuture<'_, Result<String, PluginError>>;
}

/// Stable function name to callable.
pub type ToolFunctions = HashMap<&'static str, Arc<dyn ToolFunction>>;
