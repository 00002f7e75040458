//! Integration tests for `McpClient` over the HTTP transport.
//!
//! A raw TCP test server stands in for the tool server: it records every
//! request and answers with whatever the test's handler returns.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use prospect_mcp::{McpClient, McpClientConfig, McpError, ProspectQuery};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: String,
}

struct Reply {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl Reply {
    fn ok(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: None,
        }
    }

    fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Handler = Arc<dyn Fn(&Recorded) -> Reply + Send + Sync>;

struct TestServer {
    port: u16,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    async fn start(handler: impl Fn(&Recorded) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    log.lock().unwrap().push(request.clone());
                    let reply = handler(&request);
                    if let Some(delay) = reply.delay {
                        tokio::time::sleep(delay).await;
                    }
                    let _ = socket
                        .write_all(http_response(reply.status, &reply.body).as_bytes())
                        .await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { port, requests }
    }

    fn client(&self, timeout_ms: u64) -> McpClient {
        McpClient::new(McpClientConfig::http("127.0.0.1", self.port).with_timeout_ms(timeout_ms))
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();

    Some(Recorded { method, path, body })
}

fn http_response(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}

fn body_json(request: &Recorded) -> serde_json::Value {
    serde_json::from_str(&request.body).unwrap()
}

#[tokio::test]
async fn find_prospects_sends_the_generic_tool_call() {
    let server = TestServer::start(|_| Reply::ok(json!({"result": "Acme Marketing BV"}))).await;
    let client = server.client(5000);

    let result = client
        .find_prospects(&ProspectQuery::new("Marketing").country("Belgium").limit(5))
        .await
        .unwrap();
    assert_eq!(result, "Acme Marketing BV");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/call_tool");
    assert_eq!(
        body_json(&requests[0]),
        json!({
            "tool_name": "find_prospects",
            "arguments": {"sector": "Marketing", "country": "Belgium", "limit": 5}
        })
    );
}

#[tokio::test]
async fn call_tool_connects_lazily() {
    let server = TestServer::start(|_| Reply::ok(json!("pong"))).await;
    let client = server.client(5000);
    assert!(!client.is_connected().await);

    let result = client.call_tool("ping", serde_json::Map::new()).await.unwrap();
    assert_eq!(result, "pong");
    assert!(client.is_connected().await);
    assert_eq!(body_json(&server.requests()[0])["arguments"], json!({}));
}

#[tokio::test]
async fn content_fragments_are_joined() {
    let server = TestServer::start(|_| {
        Reply::ok(json!({
            "result": {
                "content": [
                    {"type": "text", "text": "1. Acme"},
                    {"type": "text", "text": "2. Globex"}
                ]
            }
        }))
    })
    .await;
    let client = server.client(5000);

    let result = client
        .find_prospects(&ProspectQuery::new("Construction"))
        .await
        .unwrap();
    assert_eq!(result, "1. Acme\n2. Globex");
}

#[tokio::test]
async fn opaque_body_is_stringified() {
    let server = TestServer::start(|_| Reply::ok(json!({"count": 0}))).await;
    let client = server.client(5000);

    let result = client.call_tool("stats", serde_json::Map::new()).await.unwrap();
    assert_eq!(result, r#"{"count":0}"#);
}

#[tokio::test]
async fn timeout_names_the_tool_and_leaves_the_client_usable() {
    let server = TestServer::start(|request| {
        if body_json(request)["tool_name"] == "slow_search" {
            Reply::ok(json!("too late")).after(Duration::from_secs(2))
        } else {
            Reply::ok(json!("fast"))
        }
    })
    .await;
    let client = server.client(250);

    match client.call_tool("slow_search", serde_json::Map::new()).await {
        Err(McpError::Timeout { tool, timeout_ms }) => {
            assert_eq!(tool, "slow_search");
            assert_eq!(timeout_ms, 250);
        }
        other => panic!("Expected Timeout, got: {other:?}"),
    }
    assert!(client.is_connected().await);

    let result = client.call_tool("quick", serde_json::Map::new()).await.unwrap();
    assert_eq!(result, "fast");
}

#[tokio::test]
async fn error_status_is_propagated() {
    let server = TestServer::start(|_| Reply::status(500, r#"{"detail":"boom"}"#)).await;
    let client = server.client(5000);

    match client.find_prospects(&ProspectQuery::new("Retail")).await {
        Err(McpError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("Expected HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_json_error() {
    let server = TestServer::start(|_| Reply::status(200, "not json at all")).await;
    let client = server.client(5000);

    let result = client.call_tool("find_prospects", serde_json::Map::new()).await;
    assert!(matches!(result, Err(McpError::Json(_))), "{result:?}");
}

#[tokio::test]
async fn list_tools_reads_the_catalog() {
    let server = TestServer::start(|request| {
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/tools");
        Reply::ok(json!([
            {
                "name": "find_prospects",
                "description": "Find companies by sector and country",
                "inputSchema": {"type": "object", "required": ["sector"]}
            }
        ]))
    })
    .await;
    let client = server.client(5000);

    let tools = client.list_tools().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "find_prospects");
    assert_eq!(tools[0].input_schema["required"][0], "sector");
}

#[tokio::test]
async fn list_tools_returns_empty_on_error_response() {
    let server = TestServer::start(|_| Reply::status(500, r#"{"detail":"boom"}"#)).await;
    let client = server.client(5000);
    assert!(client.list_tools().await.is_empty());
}

#[tokio::test]
async fn list_tools_returns_empty_on_non_array() {
    let server = TestServer::start(|_| Reply::ok(json!({"tools": "nope"}))).await;
    let client = server.client(5000);
    assert!(client.list_tools().await.is_empty());
}

#[tokio::test]
async fn call_after_close_reconnects() {
    let server = TestServer::start(|_| Reply::ok(json!("again"))).await;
    let client = server.client(5000);

    client.connect().await.unwrap();
    client.close().await;
    assert!(!client.is_connected().await);

    let result = client.call_tool("ping", serde_json::Map::new()).await.unwrap();
    assert_eq!(result, "again");
    assert!(client.is_connected().await);
}
