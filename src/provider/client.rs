//! OpenAI-compatible streaming client.
//!
//! Model ids take the form `<provider>/<model>`; a `/responses/` infix marks
//! the reasoning variant of the same underlying model. The infix is stripped
//! from the wire model name; it only changes the reasoning-effort shape sent
//! along (and, for the catalogs, which card the id resolves to).

use async_trait::async_trait;
use chat_protocol::{ChatCompletionChunk, ChatCompletionRequest};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use tracing::debug;

use super::{ChunkStream, CompletionBackend, ProviderError};

/// Upstream provider selected by the model-id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

/// A gateway model id, split into routing parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModelId {
    pub provider: Provider,
    /// Model name as sent to the provider.
    pub wire_model: String,
    /// True when the id carries the `/responses/` infix.
    pub responses_variant: bool,
}

/// Split `<provider>/[responses/]<model>` into its parts.
pub fn parse_model_id(model_id: &str) -> Result<ParsedModelId, ProviderError> {
    let (provider, rest) = model_id
        .split_once('/')
        .ok_or_else(|| ProviderError::InvalidModel(model_id.to_string()))?;

    let provider = match provider {
        "openai" => Provider::OpenAi,
        "gemini" => Provider::Gemini,
        _ => return Err(ProviderError::InvalidModel(model_id.to_string())),
    };

    let (wire_model, responses_variant) = match rest.strip_prefix("responses/") {
        Some(model) => (model, true),
        None => (rest, false),
    };
    if wire_model.is_empty() {
        return Err(ProviderError::InvalidModel(model_id.to_string()));
    }

    Ok(ParsedModelId {
        provider,
        wire_model: wire_model.to_string(),
        responses_variant,
    })
}

pub struct ProviderClient {
    http: reqwest::Client,
    openai_base_url: String,
    openai_api_key: String,
    gemini_base_url: String,
    gemini_api_key: Option<String>,
}

impl ProviderClient {
    pub fn new(
        http: reqwest::Client,
        openai_base_url: String,
        openai_api_key: String,
        gemini_base_url: String,
        gemini_api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            openai_base_url,
            openai_api_key,
            gemini_base_url,
            gemini_api_key,
        }
    }

    fn endpoint_for(&self, provider: Provider) -> (String, &str) {
        match provider {
            Provider::OpenAi => (
                format!(
                    "{}/chat/completions",
                    self.openai_base_url.trim_end_matches('/')
                ),
                self.openai_api_key.as_str(),
            ),
            Provider::Gemini => (
                format!(
                    "{}/chat/completions",
                    self.gemini_base_url.trim_end_matches('/')
                ),
                self.gemini_api_key.as_deref().unwrap_or_default(),
            ),
        }
    }
}

#[async_trait]
impl CompletionBackend for ProviderClient {
    async fn stream_chat(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<ChunkStream, ProviderError> {
        let parsed = parse_model_id(&request.model)?;
        request.model = parsed.wire_model.clone();
        request.stream = true;

        let (url, api_key) = self.endpoint_for(parsed.provider);
        debug!("opening completion stream for {}", parsed.wire_model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| ProviderError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chunks = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let done = matches!(event, Ok(event) if event.data.trim() == "[DONE]");
                futures::future::ready(!done)
            })
            .filter_map(|event| {
                futures::future::ready(match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(
                        serde_json::from_str::<ChatCompletionChunk>(&event.data)
                            .map_err(|err| ProviderError::Stream(format!("bad chunk: {err}"))),
                    ),
                    Err(err) => Some(Err(ProviderError::Stream(err.to_string()))),
                })
            });

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_model_id() {
        let parsed = parse_model_id("openai/gpt-5").unwrap();
        assert_eq!(parsed.provider, Provider::OpenAi);
        assert_eq!(parsed.wire_model, "gpt-5");
        assert!(!parsed.responses_variant);
    }

    #[test]
    fn test_parse_responses_variant() {
        let parsed = parse_model_id("openai/responses/gpt-5").unwrap();
        assert_eq!(parsed.wire_model, "gpt-5");
        assert!(parsed.responses_variant);
    }

    #[test]
    fn test_parse_gemini() {
        let parsed = parse_model_id("gemini/gemini-3-flash-preview").unwrap();
        assert_eq!(parsed.provider, Provider::Gemini);
        assert_eq!(parsed.wire_model, "gemini-3-flash-preview");
    }

    #[test]
    fn test_parse_rejects_unknown_provider_and_bad_shapes() {
        assert!(parse_model_id("anthropic/claude").is_err());
        assert!(parse_model_id("gpt-5").is_err());
        assert!(parse_model_id("openai/responses/").is_err());
    }

    #[test]
    fn test_endpoint_for_trims_slash() {
        let client = ProviderClient::new(
            reqwest::Client::new(),
            "https://api.openai.com/v1/".to_string(),
            "key".to_string(),
            "https://gemini.example/v1beta/openai".to_string(),
            None,
        );
        let (url, key) = client.endpoint_for(Provider::OpenAi);
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(key, "key");
    }
}
