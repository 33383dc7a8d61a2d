//! In-memory store backend, used by tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{McpStore, SkillStore, Store, StoreResult, UserMcp, UserSkill};

#[derive(Default)]
pub struct MemoryStore {
    skills: RwLock<Vec<UserSkill>>,
    mcps: RwLock<Vec<UserMcp>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A `Store` aggregate backed by one shared in-memory instance.
    pub fn new_store() -> Store {
        let inner = Self::new();
        Store {
            skills: inner.clone(),
            mcps: inner,
        }
    }
}

#[async_trait]
impl SkillStore for MemoryStore {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<UserSkill>> {
        let mut rows: Vec<UserSkill> = self
            .skills
            .read()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<UserSkill>> {
        Ok(self
            .skills
            .read()
            .iter()
            .find(|row| row.user_id == user_id && row.id == id)
            .cloned())
    }

    async fn get_by_name(&self, user_id: Uuid, name: &str) -> StoreResult<Option<UserSkill>> {
        Ok(self
            .skills
            .read()
            .iter()
            .find(|row| row.user_id == user_id && row.name == name)
            .cloned())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        name: &str,
        description: &str,
        content: &str,
    ) -> StoreResult<UserSkill> {
        let mut rows = self.skills.write();
        let now = Utc::now();
        if let Some(row) = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.name == name)
        {
            row.description = description.to_string();
            row.content = content.to_string();
            row.updated_at = now;
            return Ok(row.clone());
        }
        let row = UserSkill {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            description: description.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        description: Option<&str>,
        content: Option<&str>,
    ) -> StoreResult<Option<UserSkill>> {
        let mut rows = self.skills.write();
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.id == id)
        else {
            return Ok(None);
        };
        if let Some(description) = description {
            row.description = description.to_string();
        }
        if let Some(content) = content {
            row.content = content.to_string();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut rows = self.skills.write();
        let before = rows.len();
        rows.retain(|row| !(row.user_id == user_id && row.id == id));
        Ok(rows.len() != before)
    }
}

#[async_trait]
impl McpStore for MemoryStore {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<UserMcp>> {
        let mut rows: Vec<UserMcp> = self
            .mcps
            .read()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<UserMcp>> {
        Ok(self
            .mcps
            .read()
            .iter()
            .find(|row| row.user_id == user_id && row.id == id)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, name: &str, config: Value) -> StoreResult<UserMcp> {
        if self
            .mcps
            .read()
            .iter()
            .any(|row| row.user_id == user_id && row.name == name)
        {
            return Err(super::StoreError::Database(format!(
                "duplicate MCP name for user: {name}"
            )));
        }
        let now = Utc::now();
        let row = UserMcp {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            config,
            last_status: None,
            last_tool_count: None,
            last_checked_at: None,
            created_at: now,
            updated_at: now,
        };
        self.mcps.write().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        config: Option<Value>,
    ) -> StoreResult<Option<UserMcp>> {
        let mut rows = self.mcps.write();
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.id == id)
        else {
            return Ok(None);
        };
        if let Some(name) = name {
            row.name = name.to_string();
        }
        if let Some(config) = config {
            row.config = config;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        last_status: &str,
        last_tool_count: Option<i32>,
    ) -> StoreResult<Option<UserMcp>> {
        let mut rows = self.mcps.write();
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.id == id)
        else {
            return Ok(None);
        };
        row.last_status = Some(last_status.to_string());
        row.last_tool_count = last_tool_count;
        row.last_checked_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut rows = self.mcps.write();
        let before = rows.len();
        rows.retain(|row| !(row.user_id == user_id && row.id == id));
        Ok(rows.len() != before)
    }
}
