//! Persistence behind repository traits.
//!
//! Every operation is keyed by the owning user's id; a row belonging to a
//! different user is indistinguishable from a missing row. Production runs
//! on Postgres; tests use the in-memory backend.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
}

/// A user-owned skill row.
#[derive(Debug, Clone, Serialize)]
pub struct UserSkill {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-owned MCP server config row.
#[derive(Debug, Clone, Serialize)]
pub struct UserMcp {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
    pub config: Value,
    pub last_status: Option<String>,
    pub last_tool_count: Option<i32>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait SkillStore: Send + Sync {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<UserSkill>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<UserSkill>>;

    async fn get_by_name(&self, user_id: Uuid, name: &str) -> StoreResult<Option<UserSkill>>;

    /// Create or replace the skill keyed by `(user_id, name)`.
    async fn upsert(
        &self,
        user_id: Uuid,
        name: &str,
        description: &str,
        content: &str,
    ) -> StoreResult<UserSkill>;

    /// Update fields by id; `None` leaves a field unchanged. Returns the
    /// updated row, or `None` when the row does not exist for this user.
    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        description: Option<&str>,
        content: Option<&str>,
    ) -> StoreResult<Option<UserSkill>>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait McpStore: Send + Sync {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<UserMcp>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<UserMcp>>;

    async fn create(&self, user_id: Uuid, name: &str, config: Value) -> StoreResult<UserMcp>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        config: Option<Value>,
    ) -> StoreResult<Option<UserMcp>>;

    /// Record the outcome of a connectivity probe.
    async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        last_status: &str,
        last_tool_count: Option<i32>,
    ) -> StoreResult<Option<UserMcp>>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

/// Aggregate handle passed around as one value.
pub struct Store {
    pub skills: Arc<dyn SkillStore>,
    pub mcps: Arc<dyn McpStore>,
}
