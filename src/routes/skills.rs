//! User-skill endpoints: list, get, update, delete.

use agw_auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, server::AppState, store::UserSkill};

#[derive(Debug, Serialize)]
pub struct SkillListResponse {
    pub skills: Vec<UserSkill>,
}

#[derive(Debug, Deserialize)]
pub struct SkillUpdateRequest {
    pub description: Option<String>,
    pub content: Option<String>,
}

pub async fn list_skills(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SkillListResponse>, ApiError> {
    let skills = state.store.skills.list(user_id).await?;
    Ok(Json(SkillListResponse { skills }))
}

pub async fn get_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserSkill>, ApiError> {
    state
        .store
        .skills
        .get(user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Skill not found".to_string()))
}

pub async fn update_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SkillUpdateRequest>,
) -> Result<Json<UserSkill>, ApiError> {
    state
        .store
        .skills
        .update_by_id(
            user_id,
            id,
            body.description.as_deref(),
            body.content.as_deref(),
        )
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Skill not found".to_string()))
}

pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.skills.delete(user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Skill not found".to_string()))
    }
}
