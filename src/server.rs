//! Application state and router assembly.

use std::sync::Arc;

use agw_auth::JwtKeys;
use axum::{extract::FromRef, http::HeaderValue, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    catalog::{ModelCatalog, PromptCatalog},
    domain::SkillCatalog,
    provider::CompletionBackend,
    routes,
    store::Store,
    tools::ToolSet,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub models: Arc<ModelCatalog>,
    pub prompts: Arc<PromptCatalog>,
    pub skill_catalog: Arc<SkillCatalog>,
    /// Built-in tools; cloned and extended with MCP tools per request.
    pub tools: ToolSet,
    pub backend: Arc<dyn CompletionBackend>,
    pub jwt: JwtKeys,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
