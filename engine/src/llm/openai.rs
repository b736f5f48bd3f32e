use super::{send_json, GenerationRequest, ProviderKind};
use crate::config::ModelEndpointConfig;
use crate::secrets::SecretString;
use sdk::errors::{EngineError, TransportError};
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat completions, also used for OpenAI-compatible servers
///
/// The conversation is a flat message list: one `system` entry carrying the
/// system prompt, then every turn with its role unchanged.
pub struct OpenAIProvider {
    config: ModelEndpointConfig,
    api_key: SecretString,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a provider for `kind`
    ///
    /// `openai_compatible` endpoints have no public default and must set
    /// `base_url`.
    pub fn new(
        kind: ProviderKind,
        config: ModelEndpointConfig,
        api_key: SecretString,
        client: reqwest::Client,
    ) -> super::Result<Self> {
        let base_url = match (&config.base_url, kind) {
            (Some(url), _) => super::normalize_base_url(url),
            (None, ProviderKind::OpenAiCompatible) => {
                return Err(EngineError::config(format!(
                    "openai_compatible model '{}' requires a base_url",
                    config.model
                )));
            }
            (None, _) => DEFAULT_BASE_URL.to_string(),
        };

        Ok(Self {
            config,
            api_key,
            base_url,
            client,
        })
    }

    pub fn config(&self) -> &ModelEndpointConfig {
        &self.config
    }

    /// Build the chat completions request body
    pub fn build_payload(&self, request: &GenerationRequest) -> Value {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        messages.push(json!({
            "role": "system",
            "content": request.system_prompt,
        }));
        for turn in &request.turns {
            messages.push(json!({
                "role": turn.role.to_string(),
                "content": turn.text,
            }));
        }

        json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        })
    }

    pub async fn generate(&self, request: &GenerationRequest) -> super::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = self.build_payload(request);

        let data = send_json(
            self.client
                .post(&url)
                .header(
                    "Authorization",
                    format!("Bearer {}", self.api_key.unsecure()),
                )
                .header("Content-Type", "application/json")
                .json(&payload),
        )
        .await?;

        extract_text(&data)
    }
}

/// Pull `choices[0].message.content` out of a completion response
fn extract_text(data: &Value) -> super::Result<String> {
    let choice = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| TransportError::MalformedResponse("No choices in response".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| TransportError::MalformedResponse("No message in choice".to_string()))?;

    match message.get("content").and_then(|c| c.as_str()) {
        Some(content) => Ok(content.trim().to_string()),
        None => Err(TransportError::MalformedResponse("Empty content".to_string()).into()),
    }
}
