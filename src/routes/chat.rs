//! The chat endpoint: decode, validate, resolve context, stream.

use agw_auth::AuthUser;
use agw_mcp::McpToolBridge;
use axum::{extract::State, response::Response, Json};
use chat_protocol::ClientMessage;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    agents::{AgentKind, ChatAgent, ResearchAgent},
    catalog::ModelCard,
    context::{self, RequestScope},
    domain::{McpService, SkillService},
    error::ApiError,
    server::AppState,
    streaming::{sse::sse_response, EventSink},
};

/// Size of the event channel between the agent task and the HTTP writer.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ClientMessage>,
    #[serde(rename = "modelId")]
    pub model_id: Option<String>,
    #[serde(rename = "promptId")]
    pub prompt_id: Option<String>,
    #[serde(rename = "agentId", default = "default_agent_id")]
    pub agent_id: String,
}

fn default_agent_id() -> String {
    "chat".to_string()
}

pub async fn handle_chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let agent_kind = AgentKind::parse(&request.agent_id).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unknown agentId: {}. Supported: chat, research",
            request.agent_id
        ))
    })?;

    let model_id = match &request.model_id {
        Some(id) => id.clone(),
        None => state.models.default_id().to_string(),
    };
    let model = state
        .models
        .get(&model_id)
        .cloned()
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid modelId: {model_id}. Use GET /api/models for allowed models."
            ))
        })?;

    if request.messages.iter().any(|m| !m.has_payload()) {
        return Err(ApiError::BadRequest(
            "messages must carry non-empty content or parts".to_string(),
        ));
    }

    let mut messages = request.messages;
    if let Some(prompt_id) = &request.prompt_id {
        let content = state
            .prompts
            .content_by_id(prompt_id)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid promptId: {prompt_id}")))?;
        messages.insert(0, ClientMessage::system(content));
    }

    let skills_xml =
        SkillService::available_skills_xml(&state.skill_catalog, &state.store, user_id).await?;
    messages.insert(0, ClientMessage::system(skills_xml));

    info!(
        "starting {} agent for user {} on {}",
        request.agent_id, user_id, model.id
    );

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let sink = EventSink::new(tx);
    let scope = RequestScope::new(user_id, state.store.clone());

    match agent_kind {
        AgentKind::Chat => {
            tokio::spawn(context::with_scope(
                scope,
                run_chat_agent(state, model, user_id, messages, sink),
            ));
        }
        AgentKind::Research => {
            let agent = ResearchAgent::new(state.backend.clone(), model);
            tokio::spawn(context::with_scope(scope, agent.run(messages, sink)));
        }
    }

    Ok(sse_response(ReceiverStream::new(rx)))
}

/// Producer task for the chat agent: merge the caller's MCP tools, run the
/// loop, and close every session afterwards on every path.
async fn run_chat_agent(
    state: AppState,
    model: ModelCard,
    user_id: Uuid,
    messages: Vec<ClientMessage>,
    sink: EventSink,
) {
    let configs = match McpService::configs_for_user(&state.store, user_id).await {
        Ok(configs) => configs,
        Err(err) => {
            warn!("failed to load MCP configs, continuing without: {}", err);
            Vec::new()
        }
    };

    let bridge = McpToolBridge::open(&configs).await;
    let mut tools = state.tools.clone();
    let bridged = bridge.bridged_tools(&tools.names()).await;
    tools.extend_with_mcp(bridged);

    // The agent owns its tool set; when `run` returns the MCP handlers are
    // dropped and each session can be shut down cleanly.
    ChatAgent::new(state.backend.clone(), model, tools)
        .run(messages, sink)
        .await;
    bridge.close_all().await;
}
