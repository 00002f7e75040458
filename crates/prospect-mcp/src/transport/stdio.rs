//! Stdio transport: the server runs as a child process.
//!
//! Requests are newline-delimited JSON-RPC written to the child's stdin;
//! responses are read from its stdout and routed back to the waiting caller
//! by request id.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::client::McpToolInfo;
use crate::config::McpClientConfig;
use crate::content::ToolResponse;
use crate::error::McpError;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

/// MCP protocol version we speak.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// How long `shutdown` waits for the child to exit on its own.
const GRACEFUL_EXIT: Duration = Duration::from_secs(5);

/// Callers waiting on a response, keyed by request id.
#[derive(Default)]
struct Pending {
    waiters: HashMap<u64, oneshot::Sender<JsonRpcResponse>>,
    /// Set once the child's stdout closes; no response can arrive after that.
    closed: bool,
}

pub(crate) struct StdioTransport {
    server: String,
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: Arc<Mutex<Pending>>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    child: Mutex<Child>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ToolsListResult {
    tools: Vec<McpToolInfo>,
}

impl StdioTransport {
    /// Split the configured command line, spawn it and run the MCP handshake.
    ///
    /// If the handshake fails the child is shut down before the error is returned.
    pub(crate) async fn open(config: &McpClientConfig) -> Result<Self, McpError> {
        let command = config
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                McpError::Config("the stdio transport requires a server command".to_string())
            })?;

        let mut words = shlex::split(command)
            .ok_or_else(|| McpError::Config(format!("cannot split command line: {command}")))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| McpError::Config("the server command is empty".to_string()))?;
        let args: Vec<String> = words.collect();

        let transport = Self::spawn(&program, &args, &config.env, config.timeout())?;
        if let Err(e) = transport.initialize().await {
            tracing::warn!("MCP handshake with '{}' failed: {e}", transport.server);
            transport.shutdown().await;
            return Err(e);
        }

        tracing::info!("MCP server '{}' initialized over stdio", transport.server);
        Ok(transport)
    }

    /// Spawn the child process and start background reader/writer tasks.
    fn spawn(
        program: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, McpError> {
        let mut child = Command::new(program)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::SpawnFailed {
                command: program.to_string(),
                source: e,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(McpError::Protocol(format!(
                "stdio pipes for '{program}' were not captured"
            )));
        };

        let pending = Arc::new(Mutex::new(Pending::default()));

        // Writer: drain the channel into the child's stdin, one message per line
        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                let line = format!("{msg}\n");
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        // Reader: route each response line to whoever is waiting on its id
        let pending_for_reader = Arc::clone(&pending);
        let server = program.to_string();
        let reader_server = server.clone();
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let message: serde_json::Value = match serde_json::from_str(&line) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(
                            "Unparseable line from MCP server '{reader_server}': {e}: {line}"
                        );
                        continue;
                    }
                };
                // Requests from the server share the id space with our own
                if message.get("method").is_some() {
                    tracing::debug!("Ignoring request from MCP server '{reader_server}': {line}");
                    continue;
                }
                let resp: JsonRpcResponse = match serde_json::from_value(message) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(
                            "Malformed response from MCP server '{reader_server}': {e}: {line}"
                        );
                        continue;
                    }
                };
                // Server notifications carry no id and are ignored. A reply to a
                // request that already timed out finds no waiter and is dropped.
                if let Some(id) = resp.id {
                    if let Some(tx) = pending_for_reader.lock().await.waiters.remove(&id) {
                        let _ = tx.send(resp);
                    }
                }
            }
            tracing::debug!("MCP server '{reader_server}' closed its stdout");
            let mut pending = pending_for_reader.lock().await;
            pending.closed = true;
            pending.waiters.clear();
        });

        Ok(Self {
            server,
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            reader_handle,
            writer_handle,
            child: Mutex::new(child),
            timeout,
        })
    }

    async fn initialize(&self) -> Result<(), McpError> {
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "prospectfinder",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        self.send_request("initialize", Some(params), "initialize")
            .await?
            .into_result(&self.server, "initialize")?;

        self.send_notification("notifications/initialized", None)
            .await
    }

    pub(crate) async fn call_tool(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<ToolResponse, McpError> {
        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });
        let result = self
            .send_request("tools/call", Some(params), tool_name)
            .await?
            .into_result(&self.server, "tools/call")?;

        let is_error = result
            .get("isError")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let response = ToolResponse::from_value(result);
        if is_error {
            return Err(McpError::ToolFailed {
                tool: tool_name.to_string(),
                message: response.into_text(),
            });
        }
        Ok(response)
    }

    pub(crate) async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        let result = self
            .send_request("tools/list", None, "tools/list")
            .await?
            .into_result(&self.server, "tools/list")?;
        let list: ToolsListResult = serde_json::from_value(result).map_err(|e| {
            McpError::Protocol(format!("Failed to parse tools/list response: {e}"))
        })?;
        Ok(list.tools)
    }

    /// Send a request and wait for its response, bounded by the configured timeout.
    ///
    /// `subject` names the operation in a timeout error. On timeout the waiter is
    /// removed so the transport stays usable for the next request.
    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        subject: &str,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let serialized = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(self.server_exited());
            }
            pending.waiters.insert(id, tx);
        }

        tracing::debug!("-> '{}' {method} (id {id})", self.server);
        // The writer only stops once the child's stdin is gone
        if self.write_tx.send(serialized).await.is_err() {
            self.pending.lock().await.waiters.remove(&id);
            return Err(self.server_exited());
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(self.server_exited()),
            Err(_) => {
                self.pending.lock().await.waiters.remove(&id);
                Err(McpError::Timeout {
                    tool: subject.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Fire-and-forget; no response is expected.
    async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let serialized = serde_json::to_string(&JsonRpcRequest::notification(method, params))?;
        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| self.server_exited())
    }

    fn server_exited(&self) -> McpError {
        McpError::Protocol(format!("MCP server '{}' exited", self.server))
    }

    /// Close stdin, give the child a moment to exit, then kill it.
    pub(crate) async fn shutdown(self) {
        let Self {
            write_tx,
            child,
            reader_handle,
            writer_handle,
            server,
            ..
        } = self;

        // Dropping the sender ends the writer task, which closes the child's stdin
        drop(write_tx);

        let mut child = child.into_inner();
        if tokio::time::timeout(GRACEFUL_EXIT, child.wait())
            .await
            .is_err()
        {
            tracing::debug!("MCP server '{server}' did not exit, killing it");
            let _ = child.kill().await;
        }

        reader_handle.abort();
        writer_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &str, timeout_ms: u64) -> McpClientConfig {
        McpClientConfig::stdio(command).with_timeout_ms(timeout_ms)
    }

    #[tokio::test]
    async fn spawn_and_shutdown_cat() {
        let transport = StdioTransport::spawn("cat", &[], &HashMap::new(), Duration::from_secs(5));
        assert!(transport.is_ok());
        transport.unwrap().shutdown().await;
    }

    #[tokio::test]
    async fn spawn_nonexistent_command_fails() {
        let result = StdioTransport::open(&config("this_command_does_not_exist_xyz123", 5000)).await;
        match result {
            Err(McpError::SpawnFailed { command, .. }) => {
                assert_eq!(command, "this_command_does_not_exist_xyz123");
            }
            Err(other) => panic!("Expected SpawnFailed, got: {other:?}"),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn missing_command_is_a_config_error() {
        let mut cfg = McpClientConfig::stdio("   ");
        assert!(matches!(
            StdioTransport::open(&cfg).await,
            Err(McpError::Config(_))
        ));

        cfg.command = None;
        assert!(matches!(
            StdioTransport::open(&cfg).await,
            Err(McpError::Config(_))
        ));
    }

    #[tokio::test]
    async fn unbalanced_quotes_are_a_config_error() {
        let result = StdioTransport::open(&config("python -c 'print(1)", 5000)).await;
        assert!(matches!(result, Err(McpError::Config(_))));
    }

    #[tokio::test]
    async fn handshake_timeout_names_initialize() {
        // `sleep` never answers, so the handshake times out and the child is reaped
        let result = StdioTransport::open(&config("sleep 10", 100)).await;
        match result {
            Err(McpError::Timeout { tool, timeout_ms }) => {
                assert_eq!(tool, "initialize");
                assert_eq!(timeout_ms, 100);
            }
            Err(other) => panic!("Expected Timeout, got: {other:?}"),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn exited_server_fails_fast() {
        // `true` exits immediately, closing stdout before any reply
        let result = StdioTransport::open(&config("true", 5000)).await;
        match result {
            Err(McpError::Protocol(msg)) => assert!(msg.contains("exited"), "{msg}"),
            Err(McpError::Timeout { .. }) => panic!("Expected a fast failure, got a timeout"),
            Err(other) => panic!("Expected Protocol error, got: {other:?}"),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn notification_does_not_block() {
        let transport =
            StdioTransport::spawn("cat", &[], &HashMap::new(), Duration::from_secs(5)).unwrap();
        let result = transport
            .send_notification("notifications/initialized", None)
            .await;
        assert!(result.is_ok());
        transport.shutdown().await;
    }
}
