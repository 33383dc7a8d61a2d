//! MCP management endpoints.

use agw_auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    domain::{mcps::McpCheck, McpService},
    error::ApiError,
    server::AppState,
    store::UserMcp,
};

#[derive(Debug, Deserialize)]
pub struct McpCreate {
    pub name: String,
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct McpUpdate {
    pub name: Option<String>,
    pub config: Option<Value>,
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 128 {
        return Err(ApiError::BadRequest(
            "name must be 1-128 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_mcps(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserMcp>>, ApiError> {
    Ok(Json(McpService::list(&state.store, user_id).await?))
}

pub async fn get_mcp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserMcp>, ApiError> {
    Ok(Json(McpService::get(&state.store, user_id, id).await?))
}

pub async fn create_mcp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<McpCreate>,
) -> Result<(StatusCode, Json<UserMcp>), ApiError> {
    validate_name(&body.name)?;
    let row = McpService::create(&state.store, user_id, &body.name, &body.config).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_mcp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<McpUpdate>,
) -> Result<Json<UserMcp>, ApiError> {
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    let row = McpService::update(
        &state.store,
        user_id,
        id,
        body.name.as_deref(),
        body.config.as_ref(),
    )
    .await?;
    Ok(Json(row))
}

pub async fn delete_mcp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    McpService::delete(&state.store, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_mcp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<McpCheck>, ApiError> {
    Ok(Json(McpService::check(&state.store, user_id, id).await?))
}
