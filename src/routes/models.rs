//! Model list endpoint.

use agw_auth::AuthUser;
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::AppState;

pub async fn list_models(State(state): State<AppState>, _user: AuthUser) -> Json<Value> {
    Json(json!({"models": state.models.cards()}))
}
