//! ProspectFinder plugin for the agent host.
//!
//! Connects to the ProspectFinder MCP server when the agent starts and exposes
//! its `find_prospects` tool, plus the server's tool catalog, as functions the
//! host can hand to the model.

mod functions;
pub mod plugin;
pub mod triggers;

pub use plugin::{PLUGIN_NAME, ProspectFinderPlugin};
pub use prospect_mcp::{McpClientConfig, McpToolInfo, ProspectQuery};
pub use triggers::{TRIGGER_PHRASES, is_prospect_request};
