//! Persisted MCP server configuration shapes.
//!
//! Exactly two transports are accepted, discriminated by the `transport`
//! field. The management API validates incoming config JSON through
//! [`validate_config`] before anything is written.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{McpError, McpResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "kebab-case")]
pub enum McpServerConfig {
    /// Spawn a child process and speak MCP over its standard streams.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Speak MCP streamable-http against a server URL.
    StreamableHttp {
        url: String,
        /// Extra request headers, merged over `api_key`.
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
        /// Sent as `X-API-Key` when set.
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

impl McpServerConfig {
    /// Short human-readable target, used in log lines.
    pub fn target(&self) -> &str {
        match self {
            Self::Stdio { command, .. } => command,
            Self::StreamableHttp { url, .. } => url,
        }
    }
}

/// Validate a raw config value and return the normalized JSON to persist.
///
/// Rejects unknown transports, missing fields, and empty `command`/`url`.
pub fn validate_config(raw: &Value) -> McpResult<Value> {
    let config: McpServerConfig = serde_json::from_value(raw.clone())
        .map_err(|err| McpError::Config(format!("config.transport must be 'stdio' or 'streamable-http' with its required fields: {err}")))?;

    match &config {
        McpServerConfig::Stdio { command, .. } if command.is_empty() => {
            return Err(McpError::Config("command must not be empty".to_string()));
        }
        McpServerConfig::StreamableHttp { url, .. } if url.is_empty() => {
            return Err(McpError::Config("url must not be empty".to_string()));
        }
        _ => {}
    }

    serde_json::to_value(&config).map_err(|err| McpError::Config(err.to_string()))
}
