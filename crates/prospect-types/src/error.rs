//! Error hierarchy shared between plugins and their host.

use thiserror::Error;

/// A boxed error that keeps the original type reachable via downcasting.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a plugin through the host contract.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin '{plugin}' is not initialized: on_agent_start has not been called")]
    NotInitialized { plugin: String },

    #[error("Plugin '{plugin}' failed to start: {source}")]
    Start {
        plugin: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid arguments for '{function}': {message}")]
    InvalidArguments { function: String, message: String },

    #[error("Unknown tool function: {name}")]
    UnknownFunction { name: String },

    /// A failure from the plugin's backend, carried through untouched.
    #[error("{0}")]
    Tool(#[source] BoxError),
}

impl PluginError {
    /// Wrap a backend error without changing its type.
    pub fn tool(err: impl Into<BoxError>) -> Self {
        Self::Tool(err.into())
    }

    /// Borrow the wrapped backend error as `E`, if this error carries one of that type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Tool(source) | Self::Start { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
