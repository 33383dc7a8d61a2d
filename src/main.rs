use std::{path::Path, sync::Arc};

use agw_auth::JwtKeys;
use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agw::{
    catalog::{ModelCatalog, PromptCatalog},
    config::AppConfig,
    domain::SkillCatalog,
    provider::client::ProviderClient,
    server::{build_router, AppState},
    store::postgres::{connect_pool, PostgresStore},
    tools::builtin_tools,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::parse();

    let pool = connect_pool(&config.database_url).context("connect to database")?;
    let store = Arc::new(PostgresStore::new_store(pool));

    let http = reqwest::Client::new();
    let skill_catalog = Arc::new(SkillCatalog::load(Path::new(&config.skills_dir)));
    info!("loaded {} built-in skills", skill_catalog.skills().len());

    let tools = builtin_tools(
        http.clone(),
        config.weather_base_url.clone(),
        skill_catalog.clone(),
    );

    let backend = Arc::new(ProviderClient::new(
        http,
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.gemini_base_url.clone(),
        config.gemini_api_key.clone(),
    ));

    let state = AppState {
        store,
        models: Arc::new(ModelCatalog::default()),
        prompts: Arc::new(PromptCatalog::default()),
        skill_catalog,
        tools,
        backend,
        jwt: JwtKeys::new(&config.secret_key),
    };

    let app = build_router(state, &config.cors_origins_list());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("listening on {}", addr);

    axum::serve(listener, app).await.context("serve")?;
    Ok(())
}
