//! Tool functions exported to the host.

use std::sync::Arc;

use prospect_mcp::ProspectQuery;
use prospect_types::{BoxFuture, PluginError, ToolDefinition, ToolFunction, ToolFunctions};

use crate::plugin::ProspectFinderPlugin;

pub(crate) fn export(plugin: &ProspectFinderPlugin) -> ToolFunctions {
    let mut functions = ToolFunctions::new();
    functions.insert(
        "find_prospects",
        Arc::new(FindProspects {
            plugin: plugin.clone(),
        }) as Arc<dyn ToolFunction>,
    );
    functions.insert(
        "list_available_tools",
        Arc::new(ListAvailableTools {
            plugin: plugin.clone(),
        }) as Arc<dyn ToolFunction>,
    );
    functions
}

struct FindProspects {
    plugin: ProspectFinderPlugin,
}

impl ToolFunction for FindProspects {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "find_prospects".to_string(),
            description: "Search for business prospects (companies) in a sector and country."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sector": {
                        "type": "string",
                        "description": "Business sector to search for, e.g. \"Marketing\" or \"Construction\""
                    },
                    "country": {
                        "type": "string",
                        "description": "Country to search in",
                        "default": prospect_mcp::DEFAULT_COUNTRY
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results",
                        "minimum": 1,
                        "default": prospect_mcp::DEFAULT_LIMIT
                    }
                },
                "required": ["sector"]
            }),
        }
    }

    fn call(&self, arguments: serde_json::Value) -> BoxFuture<'_, Result<String, PluginError>> {
        Box::pin(async move {
            let query: ProspectQuery =
                serde_json::from_value(arguments).map_err(|e| PluginError::InvalidArguments {
                    function: "find_prospects".to_string(),
                    message: e.to_string(),
                })?;
            self.plugin.find_prospects(&query).await
        })
    }
}

struct ListAvailableTools {
    plugin: ProspectFinderPlugin,
}

impl ToolFunction for ListAvailableTools {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_available_tools".to_string(),
            description: "List the tools offered by the prospect finder server.".to_string(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    fn call(&self, _arguments: serde_json::Value) -> BoxFuture<'_, Result<String, PluginError>> {
        Box::pin(async move {
            let tools = self.plugin.list_available_tools().await?;
            serde_json::to_string_pretty(&tools).map_err(PluginError::tool)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_mcp::McpClientConfig;

    fn functions() -> ToolFunctions {
        export(&ProspectFinderPlugin::new(McpClientConfig::default()))
    }

    #[test]
    fn definitions_match_their_keys() {
        for (name, function) in functions() {
            assert_eq!(function.definition().name, name);
        }
    }

    #[test]
    fn find_prospects_schema_requires_sector() {
        let def = functions()["find_prospects"].definition();
        assert_eq!(def.input_schema["required"], serde_json::json!(["sector"]));
        assert_eq!(def.input_schema["properties"]["country"]["default"], "Belgium");
        assert_eq!(def.input_schema["properties"]["limit"]["default"], 10);
    }

    #[tokio::test]
    async fn bad_arguments_are_rejected() {
        let result = functions()["find_prospects"]
            .call(serde_json::json!({"sector": "Marketing", "limit": "ten"}))
            .await;
        match result {
            Err(PluginError::InvalidArguments { function, .. }) => {
                assert_eq!(function, "find_prospects");
            }
            other => panic!("Expected InvalidArguments, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn calls_before_start_are_uninitialized() {
        let functions = functions();
        for _ in 0..2 {
            let result = functions["find_prospects"]
                .call(serde_json::json!({"sector": "Marketing"}))
                .await;
            assert!(matches!(result, Err(PluginError::NotInitialized { .. })));

            let result = functions["list_available_tools"]
                .call(serde_json::Value::Null)
                .await;
            assert!(matches!(result, Err(PluginError::NotInitialized { .. })));
        }
    }
}
