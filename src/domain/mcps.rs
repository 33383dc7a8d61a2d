//! MCP config management: validate-then-persist CRUD and the probe.

use agw_mcp::{probe_server, validate_config, McpServerConfig};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ApiError,
    store::{Store, UserMcp},
};

/// Probe outcome persisted to the row and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct McpCheck {
    pub status: String,
    pub tool_count: i32,
}

pub struct McpService;

impl McpService {
    pub async fn list(store: &Store, user_id: Uuid) -> Result<Vec<UserMcp>, ApiError> {
        Ok(store.mcps.list(user_id).await?)
    }

    pub async fn get(store: &Store, user_id: Uuid, id: Uuid) -> Result<UserMcp, ApiError> {
        store
            .mcps
            .get(user_id, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("MCP not found".to_string()))
    }

    pub async fn create(
        store: &Store,
        user_id: Uuid,
        name: &str,
        config: &Value,
    ) -> Result<UserMcp, ApiError> {
        let normalized =
            validate_config(config).map_err(|err| ApiError::BadRequest(err.to_string()))?;
        Ok(store.mcps.create(user_id, name, normalized).await?)
    }

    pub async fn update(
        store: &Store,
        user_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        config: Option<&Value>,
    ) -> Result<UserMcp, ApiError> {
        let normalized = match config {
            Some(raw) => {
                Some(validate_config(raw).map_err(|err| ApiError::BadRequest(err.to_string()))?)
            }
            None => None,
        };
        store
            .mcps
            .update(user_id, id, name, normalized)
            .await?
            .ok_or_else(|| ApiError::NotFound("MCP not found".to_string()))
    }

    pub async fn delete(store: &Store, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        if store.mcps.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound("MCP not found".to_string()))
        }
    }

    /// Connect to the server, list tools, and cache the outcome on the row.
    pub async fn check(store: &Store, user_id: Uuid, id: Uuid) -> Result<McpCheck, ApiError> {
        let row = Self::get(store, user_id, id).await?;

        let check = match serde_json::from_value::<McpServerConfig>(row.config.clone()) {
            Ok(config) => match probe_server(&row.name, &config).await {
                Ok(tool_count) => McpCheck {
                    status: "ok".to_string(),
                    tool_count: tool_count as i32,
                },
                Err(err) => {
                    warn!("MCP check failed for '{}': {}", row.name, err);
                    McpCheck {
                        status: "error".to_string(),
                        tool_count: 0,
                    }
                }
            },
            Err(err) => {
                warn!("MCP row '{}' has an invalid config: {}", row.name, err);
                McpCheck {
                    status: "error".to_string(),
                    tool_count: 0,
                }
            }
        };

        let tool_count = (check.status == "ok").then_some(check.tool_count);
        store
            .mcps
            .update_status(user_id, id, &check.status, tool_count)
            .await?;
        Ok(check)
    }

    /// The caller's `(name, config)` pairs for the tool bridge, skipping rows
    /// whose stored config no longer parses.
    pub async fn configs_for_user(
        store: &Store,
        user_id: Uuid,
    ) -> Result<Vec<(String, McpServerConfig)>, ApiError> {
        let rows = store.mcps.list(user_id).await?;
        let mut configs = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_value::<McpServerConfig>(row.config) {
                Ok(config) => configs.push((row.name, config)),
                Err(err) => warn!("skipping MCP '{}': stored config invalid: {}", row.name, err),
            }
        }
        Ok(configs)
    }
}
