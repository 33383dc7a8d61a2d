//! Postgres store backend.
//!
//! Expects the following tables:
//!
//! ```sql
//! users      (id uuid primary key, name text, email text unique, created_at timestamptz)
//! user_skills(id uuid primary key, user_id uuid references users(id) on delete cascade,
//!             name varchar(64) not null, description text not null, content text not null,
//!             created_at timestamptz not null, updated_at timestamptz not null,
//!             unique (user_id, name))
//! user_mcps  (id uuid primary key, user_id uuid references users(id) on delete cascade,
//!             name varchar(128) not null, config jsonb not null,
//!             last_status varchar(16), last_tool_count integer, last_checked_at timestamptz,
//!             created_at timestamptz not null, updated_at timestamptz not null,
//!             unique (user_id, name))
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde_json::Value;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use super::{McpStore, SkillStore, Store, StoreError, StoreResult, UserMcp, UserSkill};

/// Build a connection pool from a Postgres connection string.
pub fn connect_pool(database_url: &str) -> Result<Pool, StoreError> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e| StoreError::Database(format!("invalid DATABASE_URL: {e}")))?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    Pool::builder(manager)
        .max_size(16)
        .build()
        .map_err(|e| StoreError::Database(format!("build pool: {e}")))
}

pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub fn new(pool: Pool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    /// A `Store` aggregate backed by one shared pool.
    pub fn new_store(pool: Pool) -> Store {
        let inner = Self::new(pool);
        Store {
            skills: inner.clone(),
            mcps: inner,
        }
    }

    async fn client(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Database(format!("acquire connection: {e}")))
    }
}

fn db_err(err: tokio_postgres::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

fn skill_from_row(row: &Row) -> UserSkill {
    UserSkill {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn mcp_from_row(row: &Row) -> UserMcp {
    UserMcp {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        config: row.get("config"),
        last_status: row.get("last_status"),
        last_tool_count: row.get("last_tool_count"),
        last_checked_at: row.get("last_checked_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SkillStore for PostgresStore {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<UserSkill>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, user_id, name, description, content, created_at, updated_at FROM user_skills WHERE user_id = $1 ORDER BY name",
                &[&user_id],
            )
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(skill_from_row).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<UserSkill>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT id, user_id, name, description, content, created_at, updated_at FROM user_skills WHERE user_id = $1 AND id = $2",
                &[&user_id, &id],
            )
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(skill_from_row))
    }

    async fn get_by_name(&self, user_id: Uuid, name: &str) -> StoreResult<Option<UserSkill>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT id, user_id, name, description, content, created_at, updated_at FROM user_skills WHERE user_id = $1 AND name = $2",
                &[&user_id, &name],
            )
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(skill_from_row))
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        name: &str,
        description: &str,
        content: &str,
    ) -> StoreResult<UserSkill> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO user_skills (id, user_id, name, description, content, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, now(), now()) \
                     ON CONFLICT (user_id, name) DO UPDATE SET \
                         description = EXCLUDED.description, \
                         content = EXCLUDED.content, \
                         updated_at = now() \
                     RETURNING id, user_id, name, description, content, created_at, updated_at",
                &[&Uuid::new_v4(), &user_id, &name, &description, &content],
            )
            .await
            .map_err(db_err)?;
        Ok(skill_from_row(&row))
    }

    async fn update_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
        description: Option<&str>,
        content: Option<&str>,
    ) -> StoreResult<Option<UserSkill>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE user_skills SET \
                         description = COALESCE($3, description), \
                         content = COALESCE($4, content), \
                         updated_at = now() \
                     WHERE user_id = $1 AND id = $2 \
                     RETURNING id, user_id, name, description, content, created_at, updated_at",
                &[&user_id, &id, &description, &content],
            )
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(skill_from_row))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let client = self.client().await?;
        let deleted = client
            .execute(
                "DELETE FROM user_skills WHERE user_id = $1 AND id = $2",
                &[&user_id, &id],
            )
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl McpStore for PostgresStore {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<UserMcp>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, user_id, name, config, last_status, last_tool_count, last_checked_at, created_at, updated_at FROM user_mcps WHERE user_id = $1 ORDER BY name",
                &[&user_id],
            )
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(mcp_from_row).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<UserMcp>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT id, user_id, name, config, last_status, last_tool_count, last_checked_at, created_at, updated_at FROM user_mcps WHERE user_id = $1 AND id = $2",
                &[&user_id, &id],
            )
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(mcp_from_row))
    }

    async fn create(&self, user_id: Uuid, name: &str, config: Value) -> StoreResult<UserMcp> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO user_mcps (id, user_id, name, config, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, now(), now()) \
                     RETURNING id, user_id, name, config, last_status, last_tool_count, last_checked_at, created_at, updated_at",
                &[&Uuid::new_v4(), &user_id, &name, &config],
            )
            .await
            .map_err(db_err)?;
        Ok(mcp_from_row(&row))
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        config: Option<Value>,
    ) -> StoreResult<Option<UserMcp>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE user_mcps SET \
                         name = COALESCE($3, name), \
                         config = COALESCE($4, config), \
                         updated_at = now() \
                     WHERE user_id = $1 AND id = $2 \
                     RETURNING id, user_id, name, config, last_status, last_tool_count, last_checked_at, created_at, updated_at",
                &[&user_id, &id, &name, &config],
            )
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(mcp_from_row))
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        last_status: &str,
        last_tool_count: Option<i32>,
    ) -> StoreResult<Option<UserMcp>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE user_mcps SET \
                         last_status = $3, \
                         last_tool_count = $4, \
                         last_checked_at = now(), \
                         updated_at = now() \
                     WHERE user_id = $1 AND id = $2 \
                     RETURNING id, user_id, name, config, last_status, last_tool_count, last_checked_at, created_at, updated_at",
                &[&user_id, &id, &last_status, &last_tool_count],
            )
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(mcp_from_row))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let client = self.client().await?;
        let deleted = client
            .execute(
                "DELETE FROM user_mcps WHERE user_id = $1 AND id = $2",
                &[&user_id, &id],
            )
            .await
            .map_err(db_err)?;
        Ok(deleted > 0)
    }
}
