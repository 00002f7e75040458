//! ProspectFinder CLI: drives the plugin the way an agent host would.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use prospect_config::{CliOverrides, Settings};
use prospect_mcp::{DEFAULT_COUNTRY, DEFAULT_LIMIT, McpClient};
use prospect_plugin::{ProspectFinderPlugin, is_prospect_request};
use prospect_types::{AgentHandle, MessageContext, Plugin, PluginError};
use std::io;

#[derive(Parser)]
#[command(
    name = "prospectfinder",
    version,
    about = "Find business prospects through a ProspectFinder MCP server"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Transport to the MCP server: sse, http, streamable-http or stdio
    #[arg(long, global = true)]
    transport: Option<String>,

    /// MCP server host (HTTP transports)
    #[arg(long, global = true)]
    host: Option<String>,

    /// MCP server port (HTTP transports)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Command line that starts the MCP server (stdio transport)
    #[arg(long, global = true)]
    server_command: Option<String>,

    /// Per-call timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search for companies in a sector
    Find {
        /// Business sector, e.g. "Marketing"
        sector: String,

        #[arg(long, default_value = DEFAULT_COUNTRY)]
        country: String,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },

    /// List the tools the MCP server offers
    Tools,

    /// Call any server tool with JSON object arguments
    Call {
        tool: String,

        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Report whether a message would be treated as a prospect request
    Detect { message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let settings = Settings::load(CliOverrides {
        transport: cli.transport,
        host: cli.host,
        port: cli.port,
        command: cli.server_command,
        timeout_ms: cli.timeout_ms,
    })
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::debug!(
        "Using MCP server at {} via {}",
        settings.mcp.target(),
        settings.mcp.transport
    );

    match cli.command {
        Command::Find {
            sector,
            country,
            limit,
        } => {
            let arguments = serde_json::json!({
                "sector": sector,
                "country": country,
                "limit": limit,
            });
            let output = run_function(&settings, "find_prospects", arguments).await?;
            println!("{output}");
        }
        Command::Tools => {
            let output =
                run_function(&settings, "list_available_tools", serde_json::json!({})).await?;
            println!("{output}");
        }
        Command::Call { tool, args } => {
            let output = call_raw(&settings, &tool, &args).await?;
            println!("{output}");
        }
        Command::Detect { message } => {
            let plugin = ProspectFinderPlugin::new(settings.mcp);
            let echoed = plugin
                .on_message_received(message, &MessageContext::default())
                .await;
            let verdict = if is_prospect_request(&echoed) {
                "prospect request"
            } else {
                "not a prospect request"
            };
            println!("{verdict}");
        }
    }

    Ok(())
}

/// Start the plugin, invoke one of its exported functions, then clean up.
async fn run_function(
    settings: &Settings,
    name: &str,
    arguments: serde_json::Value,
) -> Result<String> {
    let plugin = ProspectFinderPlugin::new(settings.mcp.clone());
    plugin
        .on_agent_start(&AgentHandle::new("prospectfinder-cli"))
        .await
        .with_context(|| format!("Could not reach MCP server at {}", settings.mcp.target()))?;

    let functions = plugin.tool_functions();
    let result = match functions.get(name) {
        Some(function) => function.call(arguments).await,
        None => Err(PluginError::UnknownFunction {
            name: name.to_string(),
        }),
    };

    plugin.cleanup().await;
    Ok(result?)
}

/// Call a server tool directly through the MCP client.
async fn call_raw(settings: &Settings, tool: &str, args: &str) -> Result<String> {
    let arguments = match serde_json::from_str::<serde_json::Value>(args)
        .context("--args must be valid JSON")?
    {
        serde_json::Value::Object(map) => map,
        other => bail!("--args must be a JSON object, got: {other}"),
    };

    let client = McpClient::new(settings.mcp.clone());
    let result = client.call_tool(tool, arguments).await;
    client.close().await;
    match result {
        Ok(text) => Ok(text),
        Err(e) if e.is_timeout() => {
            Err(anyhow::Error::new(e).context("Raise --timeout-ms if the server needs longer"))
        }
        Err(e) => Err(e.into()),
    }
}
