//! One connected MCP server session.
//!
//! `stdio` configs spawn the command and speak over its standard streams;
//! `streamable-http` configs go through a reqwest client carrying the
//! configured credentials. The initialize handshake happens inside
//! `serve`; a session is usable as soon as `connect` returns.

use std::time::Duration;

use rmcp::{
    model::{CallToolRequestParam, CallToolResult, Tool},
    service::RunningService,
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig, ConfigureCommandExt,
        StreamableHttpClientTransport, TokioChildProcess,
    },
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    config::McpServerConfig,
    error::{McpError, McpResult},
};

type McpClient = RunningService<RoleClient, ()>;

/// Header used to pass the configured `api_key` to streamable-http servers.
const API_KEY_HEADER: &str = "X-API-Key";

pub struct McpSession {
    name: String,
    client: McpClient,
}

impl McpSession {
    /// Connect to a server and run the initialize handshake.
    pub async fn connect(name: &str, config: &McpServerConfig) -> McpResult<Self> {
        info!("Connecting to MCP server '{}' ({})", name, config.target());

        let client = match config {
            McpServerConfig::Stdio { command, args, env } => {
                let transport = TokioChildProcess::new(
                    tokio::process::Command::new(command).configure(|cmd| {
                        cmd.args(args)
                            .envs(env.iter())
                            .stderr(std::process::Stdio::inherit());
                    }),
                )
                .map_err(|e| McpError::Transport(format!("create stdio transport: {e}")))?;

                ().serve(transport)
                    .await
                    .map_err(|e| McpError::ConnectionFailed(format!("initialize stdio client: {e}")))?
            }

            McpServerConfig::StreamableHttp {
                url,
                headers,
                api_key,
            } => {
                let mut header_map = reqwest::header::HeaderMap::new();
                if let Some(key) = api_key {
                    header_map.insert(
                        API_KEY_HEADER,
                        key.parse()
                            .map_err(|_| McpError::Transport("invalid api_key value".to_string()))?,
                    );
                }
                for (k, v) in headers {
                    let header_name: reqwest::header::HeaderName = k
                        .parse()
                        .map_err(|_| McpError::Transport(format!("invalid header name: {k}")))?;
                    header_map.insert(
                        header_name,
                        v.parse().map_err(|_| {
                            McpError::Transport(format!("invalid value for header {k}"))
                        })?,
                    );
                }

                let http = reqwest::Client::builder()
                    .default_headers(header_map)
                    .connect_timeout(Duration::from_secs(10))
                    .build()
                    .map_err(|e| McpError::Transport(format!("build HTTP client: {e}")))?;

                let transport = StreamableHttpClientTransport::with_client(
                    http,
                    StreamableHttpClientTransportConfig::with_uri(url.clone()),
                );

                ().serve(transport).await.map_err(|e| {
                    McpError::ConnectionFailed(format!("initialize streamable client: {e}"))
                })?
            }
        };

        info!("Connected to MCP server '{}'", name);
        Ok(Self {
            name: name.to_string(),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        self.client
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| McpError::Transport(format!("list tools: {e}")))
    }

    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Map<String, Value>,
    ) -> McpResult<CallToolResult> {
        let request = CallToolRequestParam {
            name: std::borrow::Cow::Owned(tool_name.to_string()),
            arguments: Some(arguments),
        };
        self.client
            .call_tool(request)
            .await
            .map_err(|e| McpError::ToolExecution(format!("Failed to call tool: {e}")))
    }

    /// Shut the session down, terminating any spawned child process.
    pub async fn close(self) {
        if let Err(err) = self.client.cancel().await {
            warn!("Error closing MCP session '{}': {}", self.name, err);
        }
    }
}
