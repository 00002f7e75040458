//! HTTP transport: one reusable `reqwest` session bound to the server's base URL.

use std::future::Future;
use std::time::Duration;

use crate::client::McpToolInfo;
use crate::config::McpClientConfig;
use crate::content::ToolResponse;
use crate::error::McpError;

pub(crate) struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build the session. No handshake: the server is first contacted by the
    /// first request.
    pub(crate) fn open(config: &McpClientConfig) -> Result<Self, McpError> {
        let http = reqwest::Client::builder().build()?;
        let base_url = config.base_url();
        tracing::info!("Connecting to MCP server at {base_url}");
        Ok(Self {
            http,
            base_url,
            timeout: config.timeout(),
        })
    }

    /// `POST {base}/call_tool` with `{"tool_name", "arguments"}`.
    pub(crate) async fn call_tool(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<ToolResponse, McpError> {
        let url = format!("{}/call_tool", self.base_url);
        let body = serde_json::json!({
            "tool_name": tool_name,
            "arguments": arguments,
        });

        let value = self
            .bounded(tool_name, async {
                tracing::debug!("POST {url}");
                let response = self
                    .http
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e))?;
                self.decode(response).await
            })
            .await?;

        Ok(ToolResponse::from_value(value))
    }

    /// `GET {base}/tools`, expecting a JSON array of tool descriptors.
    pub(crate) async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        let url = format!("{}/tools", self.base_url);

        let value = self
            .bounded("tools/list", async {
                tracing::debug!("GET {url}");
                let response = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e))?;
                self.decode(response).await
            })
            .await?;

        if !value.is_array() {
            return Err(McpError::Protocol(format!(
                "expected a JSON array from {url}, got: {value}"
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Run `request` under the configured timeout. Dropping the request future
    /// cancels only that request; the session stays usable.
    async fn bounded<T>(
        &self,
        subject: &str,
        request: impl Future<Output = Result<T, McpError>>,
    ) -> Result<T, McpError> {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| McpError::Timeout {
                tool: subject.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }

    async fn decode(&self, response: reqwest::Response) -> Result<serde_json::Value, McpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn request_error(&self, e: reqwest::Error) -> McpError {
        if e.is_connect() {
            McpError::Connection {
                target: self.base_url.clone(),
                source: e,
            }
        } else {
            McpError::Http(e)
        }
    }
}
