//! Prompt list endpoint.

use agw_auth::AuthUser;
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::AppState;

pub async fn list_prompts(State(state): State<AppState>, _user: AuthUser) -> Json<Value> {
    Json(json!({"prompts": state.prompts.cards()}))
}
