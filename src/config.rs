//! Gateway settings, each a flag with an environment-variable fallback.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "agent-gateway", about = "Streaming chat gateway")]
pub struct AppConfig {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Postgres connection string for users, skills, and MCP configs.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// HMAC secret for access-token signing and verification.
    #[arg(long, env = "SECRET_KEY")]
    pub secret_key: String,

    /// Comma-separated list of allowed CORS origins.
    #[arg(
        long,
        env = "CORS_ORIGINS",
        default_value = "http://localhost:3000,http://localhost:3001"
    )]
    pub cors_origins: String,

    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    pub openai_api_key: String,

    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    #[arg(
        long,
        env = "OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub openai_base_url: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta/openai"
    )]
    pub gemini_base_url: String,

    /// Forecast endpoint used by the weather tool.
    #[arg(
        long,
        env = "WEATHER_BASE_URL",
        default_value = "https://api.open-meteo.com"
    )]
    pub weather_base_url: String,

    /// Directory of built-in skills (`<name>/SKILL.md` per skill).
    #[arg(long, env = "SKILLS_DIR", default_value = "skills")]
    pub skills_dir: String,
}

impl AppConfig {
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}
