//! Layered configuration for the ProspectFinder plugin.
//!
//! Reads the MCP connection settings from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use prospect_mcp::McpClientConfig;
use prospect_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ENV_TRANSPORT: &str = "MCP_TRANSPORT";
pub const ENV_HOST: &str = "MCP_HOST";
pub const ENV_PORT: &str = "MCP_PORT";
pub const ENV_COMMAND: &str = "MCP_COMMAND";
pub const ENV_TIMEOUT_MS: &str = "MCP_TIMEOUT_MS";

/// Settings that can be read from the TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub mcp: McpSettings,
}

/// The `[mcp]` section. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpSettings {
    pub transport: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub command: Option<String>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub transport: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub command: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Resolved settings for one plugin instance.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mcp: McpClientConfig,
    pub config_dir: PathBuf,
}

impl Settings {
    /// Load settings from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables (`MCP_TRANSPORT`, `MCP_HOST`, `MCP_PORT`,
    ///    `MCP_COMMAND`, `MCP_TIMEOUT_MS`)
    /// 3. Config file (~/.prospectfinder/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let file = load_settings_file(&config_dir.join("config.toml"));
        let mcp = resolve(overrides, file, |key| std::env::var(key).ok())?;
        Ok(Settings { mcp, config_dir })
    }
}

/// Merge the sources into a client configuration. `env` looks up a variable.
pub fn resolve(
    overrides: CliOverrides,
    file: SettingsFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<McpClientConfig, ConfigError> {
    let defaults = McpClientConfig::default();
    let file = file.mcp;

    let transport = overrides
        .transport
        .or_else(|| env(ENV_TRANSPORT))
        .or(file.transport)
        .unwrap_or(defaults.transport);

    let host = overrides
        .host
        .or_else(|| env(ENV_HOST))
        .or(file.host)
        .unwrap_or(defaults.host);

    let port = match overrides.port {
        Some(port) => Some(port),
        None => parse_env(&env, ENV_PORT)?,
    }
    .or(file.port)
    .unwrap_or(defaults.port);

    let command = overrides
        .command
        .or_else(|| env(ENV_COMMAND))
        .or(file.command);

    let timeout_ms = match overrides.timeout_ms {
        Some(ms) => Some(ms),
        None => parse_env(&env, ENV_TIMEOUT_MS)?,
    }
    .or(file.timeout_ms)
    .unwrap_or(defaults.timeout_ms);

    Ok(McpClientConfig {
        transport,
        host,
        port,
        command,
        env: file.env,
        timeout_ms,
    })
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}

/// Get the config directory path (~/.prospectfinder/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PROSPECTFINDER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".prospectfinder")
}

/// Load and parse a TOML settings file, returning defaults on any error.
pub fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
