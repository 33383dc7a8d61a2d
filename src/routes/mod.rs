//! HTTP surface under `/api`.

pub mod chat;
pub mod mcps;
pub mod models;
pub mod prompts;
pub mod skills;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::handle_chat))
        .route("/mcps", get(mcps::list_mcps).post(mcps::create_mcp))
        .route(
            "/mcps/{id}",
            get(mcps::get_mcp).put(mcps::update_mcp).delete(mcps::delete_mcp),
        )
        .route("/mcps/{id}/check", post(mcps::check_mcp))
        .route("/skills", get(skills::list_skills))
        .route(
            "/skills/{id}",
            get(skills::get_skill)
                .patch(skills::update_skill)
                .delete(skills::delete_skill),
        )
        .route("/models", get(models::list_models))
        .route("/prompts", get(prompts::list_prompts))
}
