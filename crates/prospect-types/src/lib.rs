//! Plugin host contract and shared error hierarchy for ProspectFinder.

pub mod error;
pub mod plugin;
pub mod tool;

pub use error::{BoxError, ConfigError, PluginError};
pub use plugin::{AgentHandle, BoxFuture, MessageContext, Plugin};
pub use tool::{ToolDefinition, ToolFunction, ToolFunctions};
