//! Flattening tool responses to text.
//!
//! Servers answer a tool call in one of three shapes: a bare string, a list of
//! content fragments (the MCP `tools/call` result, or an HTTP body wrapping it
//! in `result`), or some other JSON value. [`ToolResponse`] names the shape and
//! [`ToolResponse::into_text`] turns it into the text handed back to the agent.

use serde_json::Value;

/// One fragment of a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContent {
    /// The fragment's `type` tag (`text`, `image`, ...), if present.
    pub kind: Option<String>,
    pub text: Option<String>,
}

/// A tool response before it is flattened to text.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    Text(String),
    /// Fragments in server order; at least one carries text.
    Content(Vec<ToolContent>),
    Opaque(Value),
}

impl ToolResponse {
    /// Classify a decoded response body.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Array(items) => match fragments(&items) {
                Some(content) => Self::Content(content),
                None => Self::Opaque(Value::Array(items)),
            },
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.get("content") {
                    if let Some(content) = fragments(items) {
                        return Self::Content(content);
                    }
                }
                match map.remove("result") {
                    Some(result) => Self::from_value(result),
                    None => Self::Opaque(Value::Object(map)),
                }
            }
            other => Self::Opaque(other),
        }
    }

    /// Text fragments joined with newlines, in order. Strings pass through and
    /// anything else is rendered as compact JSON.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Content(content) => content
                .into_iter()
                .filter_map(|c| c.text)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Opaque(value) => value.to_string(),
        }
    }
}

/// Read `items` as content fragments. `None` unless every item is an object
/// and at least one of them carries a `text` string.
fn fragments(items: &[Value]) -> Option<Vec<ToolContent>> {
    let content = items
        .iter()
        .map(|item| {
            let obj = item.as_object()?;
            Some(ToolContent {
                kind: obj.get("type").and_then(Value::as_str).map(str::to_string),
                text: obj.get("text").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect::<Option<Vec<_>>>()?;

    content.iter().any(|c| c.text.is_some()).then_some(content)
}
