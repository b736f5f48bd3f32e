use super::{send_json, GenerationRequest, TurnRole};
use crate::config::ModelEndpointConfig;
use crate::secrets::SecretString;
use sdk::errors::TransportError;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Marker prepended to assistant turns once they are folded into the single
/// user message.
pub const ASSISTANT_MARKER: &str = "[assistant]\n";

/// Anthropic messages API
///
/// The system prompt goes into the dedicated `system` field. All turns are
/// collapsed into one `user` message made of text blocks, in order; assistant
/// turns carry [`ASSISTANT_MARKER`] so ownership survives the collapse.
pub struct AnthropicProvider {
    config: ModelEndpointConfig,
    api_key: SecretString,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: ModelEndpointConfig, api_key: SecretString, client: reqwest::Client) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .map(super::normalize_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            config,
            api_key,
            base_url,
            client,
        }
    }

    pub fn config(&self) -> &ModelEndpointConfig {
        &self.config
    }

    /// Build the messages request body
    pub fn build_payload(&self, request: &GenerationRequest) -> Value {
        let blocks: Vec<Value> = request
            .turns
            .iter()
            .map(|turn| {
                let text = match turn.role {
                    TurnRole::User => turn.text.clone(),
                    TurnRole::Assistant => format!("{}{}", ASSISTANT_MARKER, turn.text),
                };
                json!({ "type": "text", "text": text })
            })
            .collect();

        json!({
            "model": self.config.model,
            "system": request.system_prompt,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "messages": [{ "role": "user", "content": blocks }],
        })
    }

    pub async fn generate(&self, request: &GenerationRequest) -> super::Result<String> {
        let url = format!("{}/messages", self.base_url);
        let payload = self.build_payload(request);

        let data = send_json(
            self.client
                .post(&url)
                .header("x-api-key", self.api_key.unsecure())
                .header("anthropic-version", API_VERSION)
                .header("Content-Type", "application/json")
                .json(&payload),
        )
        .await?;

        extract_text(&data)
    }
}

/// Concatenate every `text` block of a messages response
fn extract_text(data: &Value) -> super::Result<String> {
    let content_arr = data
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            TransportError::MalformedResponse("No content array in response".to_string())
        })?;

    let mut full_content = String::new();
    let mut saw_text = false;
    for item in content_arr {
        if item.get("type").and_then(|t| t.as_str()) != Some("text") {
            continue;
        }
        if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
            full_content.push_str(text);
            saw_text = true;
        }
    }

    if !saw_text {
        return Err(
            TransportError::MalformedResponse("No text block in response".to_string()).into(),
        );
    }

    Ok(full_content.trim().to_string())
}
