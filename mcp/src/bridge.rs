//! Per-request tool bridge.
//!
//! Opens every configured server once at the start of a chat request, lists
//! tools, and exposes them as extra function-calling tools next to the
//! built-ins. Built-in and earlier-registered names win collisions; a server
//! that fails to open or list is skipped and the rest keep working. The
//! request task calls [`McpToolBridge::close_all`] on every exit path.

use std::{
    collections::HashSet,
    sync::Arc,
};

use chat_protocol::ToolDefinition;
use rmcp::model::{CallToolResult, Tool};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::{
    config::McpServerConfig,
    error::McpResult,
    session::McpSession,
};

/// An MCP-backed tool exposed to the model for one request.
#[derive(Clone)]
pub struct BridgedTool {
    pub definition: ToolDefinition,
    session: Arc<McpSession>,
    tool_name: String,
}

impl BridgedTool {
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Invoke the tool on its owning session and convert the result.
    pub async fn call(&self, arguments: Map<String, Value>) -> McpResult<Value> {
        let result = self.session.call_tool(&self.tool_name, arguments).await?;
        Ok(result_to_output(&result))
    }
}

pub struct McpToolBridge {
    sessions: Vec<Arc<McpSession>>,
}

impl McpToolBridge {
    /// Open sessions for each `(name, config)` pair, skipping failures.
    pub async fn open(configs: &[(String, McpServerConfig)]) -> Self {
        let mut sessions = Vec::with_capacity(configs.len());
        for (name, config) in configs {
            match McpSession::connect(name, config).await {
                Ok(session) => sessions.push(Arc::new(session)),
                Err(err) => {
                    warn!("Skipping MCP server '{}' ({}): {}", name, config.target(), err);
                }
            }
        }
        Self { sessions }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// List each session's tools and expose the ones whose names are free.
    ///
    /// `reserved` holds the built-in tool names; a later server's tool never
    /// shadows a built-in or an earlier server's tool of the same name.
    pub async fn bridged_tools(&self, reserved: &HashSet<String>) -> Vec<BridgedTool> {
        let mut seen: HashSet<String> = reserved.clone();
        let mut bridged = Vec::new();

        for session in &self.sessions {
            let listing = match session.list_tools().await {
                Ok(listing) => listing,
                Err(err) => {
                    warn!(
                        "Failed to list tools from MCP server '{}': {}",
                        session.name(),
                        err
                    );
                    continue;
                }
            };

            for tool in listing {
                let name = tool.name.to_string();
                if !seen.insert(name.clone()) {
                    warn!(
                        "Dropping MCP tool '{}' from '{}': name already registered",
                        name,
                        session.name()
                    );
                    continue;
                }
                bridged.push(BridgedTool {
                    definition: definition_for(&name, &tool),
                    session: Arc::clone(session),
                    tool_name: name,
                });
            }
        }

        bridged
    }

    /// Close every session. Handlers must be dropped first so each session
    /// has a single owner again.
    pub async fn close_all(self) {
        for session in self.sessions {
            match Arc::try_unwrap(session) {
                Ok(session) => session.close().await,
                Err(session) => {
                    warn!(
                        "MCP session '{}' still referenced at request end",
                        session.name()
                    );
                }
            }
        }
    }
}

fn definition_for(name: &str, tool: &Tool) -> ToolDefinition {
    ToolDefinition::function(
        name,
        tool.description.as_deref().unwrap_or_default(),
        normalize_input_schema(Some(&tool.input_schema)),
    )
}

/// Normalize an MCP input schema into a valid function-calling `object`
/// schema, filling in `type`, `properties`, and `additionalProperties`.
pub fn normalize_input_schema(input_schema: Option<&Map<String, Value>>) -> Value {
    let mut normalized = match input_schema {
        Some(schema) if !schema.is_empty() => schema.clone(),
        _ => {
            return json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false,
            });
        }
    };

    normalized
        .entry("type")
        .or_insert_with(|| Value::String("object".to_string()));
    normalized
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    normalized
        .entry("additionalProperties")
        .or_insert(Value::Bool(false));

    Value::Object(normalized)
}

/// Convert a tool-call result into the value fed to the model and the UI.
///
/// Errored calls become `{"error": ...}`. Otherwise the first text block wins
/// (multiple text blocks are joined with newlines), falling back to the
/// server's structured content, then to an empty string.
pub fn result_to_output(result: &CallToolResult) -> Value {
    let texts = text_blocks(&result.content);

    if result.is_error.unwrap_or(false) {
        let detail = if texts.is_empty() {
            "Tool call failed".to_string()
        } else {
            texts.join("\n")
        };
        return json!({ "error": detail });
    }

    if !texts.is_empty() {
        return Value::String(texts.join("\n"));
    }

    if let Some(structured) = &result.structured_content {
        return structured.clone();
    }

    Value::String(String::new())
}

fn text_blocks<T: serde::Serialize>(content: &T) -> Vec<String> {
    // Content blocks serialize as tagged objects; inspecting the JSON keeps
    // this independent of which block variants the server returns.
    let Ok(Value::Array(items)) = serde_json::to_value(content) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use rmcp::model::Content;

    use super::*;

    fn server_tool(name: &str, description: Option<&str>) -> Tool {
        Tool {
            name: Cow::Owned(name.to_string()),
            title: None,
            description: description.map(|d| Cow::Owned(d.to_string())),
            input_schema: Arc::new(Map::new()),
            output_schema: None,
            annotations: None,
            icons: None,
        }
    }

    #[test]
    fn test_definition_for_normalizes_schema() {
        let tool = server_tool("echo", Some("Echo things back"));
        let definition = definition_for("echo", &tool);
        assert_eq!(definition.name(), "echo");
        assert_eq!(definition.function.description, "Echo things back");
        assert_eq!(definition.function.parameters["type"], "object");
        assert_eq!(definition.function.parameters["additionalProperties"], false);
    }

    #[test]
    fn test_definition_for_missing_description_is_empty() {
        let tool = server_tool("echo", None);
        let definition = definition_for("echo", &tool);
        assert_eq!(definition.function.description, "");
    }

    #[test]
    fn test_normalize_missing_schema() {
        let normalized = normalize_input_schema(None);
        assert_eq!(normalized["type"], "object");
        assert_eq!(normalized["properties"], json!({}));
        assert_eq!(normalized["additionalProperties"], false);
    }

    #[test]
    fn test_normalize_fills_missing_keys_only() {
        let mut schema = Map::new();
        schema.insert(
            "properties".to_string(),
            json!({"q": {"type": "string"}}),
        );
        schema.insert("required".to_string(), json!(["q"]));

        let normalized = normalize_input_schema(Some(&schema));
        assert_eq!(normalized["type"], "object");
        assert_eq!(normalized["properties"]["q"]["type"], "string");
        assert_eq!(normalized["required"], json!(["q"]));
        assert_eq!(normalized["additionalProperties"], false);
    }

    #[test]
    fn test_normalize_preserves_existing_values() {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("additionalProperties".to_string(), json!(true));
        schema.insert("properties".to_string(), json!({}));

        let normalized = normalize_input_schema(Some(&schema));
        assert_eq!(normalized["additionalProperties"], true);
    }

    #[test]
    fn test_result_first_text_block_wins() {
        let result = CallToolResult::success(vec![Content::text("hi")]);
        assert_eq!(result_to_output(&result), json!("hi"));
    }

    #[test]
    fn test_result_multiple_text_blocks_joined() {
        let result = CallToolResult::success(vec![Content::text("a"), Content::text("b")]);
        assert_eq!(result_to_output(&result), json!("a\nb"));
    }

    #[test]
    fn test_result_error_flag_becomes_error_object() {
        let result = CallToolResult::error(vec![Content::text("boom")]);
        assert_eq!(result_to_output(&result), json!({"error": "boom"}));
    }

    #[test]
    fn test_result_falls_back_to_structured_content() {
        let mut result = CallToolResult::success(vec![]);
        result.structured_content = Some(json!({"rows": 3}));
        assert_eq!(result_to_output(&result), json!({"rows": 3}));
    }

    #[test]
    fn test_result_empty_content_yields_empty_string() {
        let result = CallToolResult::success(vec![]);
        assert_eq!(result_to_output(&result), json!(""));
    }
}
