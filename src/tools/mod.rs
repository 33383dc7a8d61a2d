//! Tool registry.
//!
//! Built once at startup from the built-in tools, then cloned per request and
//! extended with the caller's MCP-bridged tools. Handlers behind `Arc` make
//! the clone cheap; definitions keep their registration order, which is the
//! order the model sees.

pub mod schema;
pub mod skills;
pub mod weather;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use agw_mcp::BridgedTool;
use async_trait::async_trait;
use chat_protocol::ToolDefinition;
use serde_json::{Map, Value};
use tracing::warn;

pub use schema::{build_definition, parse_docstring, ParamKind, ParamSpec};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ToolError(pub String);

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError>;
}

/// The tool universe for one request: ordered definitions plus the
/// name-to-handler map.
#[derive(Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. First registration of a name wins.
    pub fn register(&mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) {
        let name = definition.name().to_string();
        if self.handlers.contains_key(&name) {
            warn!("tool '{}' already registered; keeping the first", name);
            return;
        }
        self.definitions.push(definition);
        self.handlers.insert(name, handler);
    }

    /// Merge MCP-bridged tools in after the built-ins.
    pub fn extend_with_mcp(&mut self, bridged: Vec<BridgedTool>) {
        for tool in bridged {
            let handler = Arc::new(McpHandler(tool.clone()));
            self.register(tool.definition, handler);
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Definitions for the provider request; `None` when no tools exist.
    pub fn definitions_option(&self) -> Option<Vec<ToolDefinition>> {
        if self.definitions.is_empty() {
            None
        } else {
            Some(self.definitions.clone())
        }
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> HashSet<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

struct McpHandler(BridgedTool);

#[async_trait]
impl ToolHandler for McpHandler {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.0
            .call(args)
            .await
            .map_err(|err| ToolError(err.to_string()))
    }
}

/// The startup registry of built-in tools.
pub fn builtin_tools(
    http: reqwest::Client,
    weather_base_url: String,
    skill_catalog: Arc<crate::domain::SkillCatalog>,
) -> ToolSet {
    let mut tools = ToolSet::new();
    weather::register(&mut tools, http, weather_base_url);
    skills::register(&mut tools, skill_catalog);
    tools
}
