//! Model Client Abstraction Layer
//!
//! This module normalizes the chat-completion protocols of the supported
//! providers (OpenAI and OpenAI-compatible servers, Anthropic) behind one
//! contract: a system prompt plus an ordered list of user/assistant turns in,
//! one trimmed text out.
//!
//! [`ModelBackend`] is the capability the rest of the engine depends on.
//! [`ModelClient`] is the closed set of provider variants implementing it;
//! adding a provider means adding a variant, never touching call sites.

use async_trait::async_trait;
use sdk::errors::{EngineError, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod anthropic;
pub mod client;
pub mod openai;

pub use client::{ModelClient, ModelRegistry};

/// Result type for model operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User turn
    User,

    /// Assistant turn
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One labeled unit of conversation text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    /// Create a new user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// Create a new assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// Uniform generation request
///
/// `temperature` and `max_tokens` override the endpoint defaults when set.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub turns: Vec<Turn>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            turns,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Supported provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// api.openai.com chat completions
    OpenAi,

    /// Any server speaking the OpenAI chat completions protocol
    OpenAiCompatible,

    /// Anthropic messages API
    Anthropic,
}

impl FromStr for ProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "openai_compatible" => Ok(Self::OpenAiCompatible),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(EngineError::config(format!(
                "Unknown provider '{}'. Must be one of: openai, openai_compatible, anthropic",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::OpenAiCompatible => write!(f, "openai_compatible"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Capability shared by every model backend
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Returns the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Generate one text response
    ///
    /// # Returns
    /// * `Ok(String)` - the trimmed response text
    /// * `Err(EngineError::Configuration)` - the request is unusable (no turns)
    /// * `Err(EngineError::Transport)` - the remote call failed
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Build the HTTP client backing one endpoint
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EngineError::config(format!("Failed to build HTTP client: {}", e)))
}

/// Send a prepared request and decode the JSON body
///
/// Connection failures, timeouts, non-2xx statuses and undecodable bodies all
/// become [`TransportError`]s.
pub(crate) async fn send_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: crate::secrets::scrub(&body),
        }
        .into());
    }

    response
        .json()
        .await
        .map_err(|e| TransportError::MalformedResponse(e.to_string()).into())
}

fn transport_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        TransportError::Timeout.into()
    } else {
        TransportError::Network(e.to_string()).into()
    }
}

/// Trim a configured base URL so paths can be appended with `/`
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let user = Turn::user("Hello");
        assert_eq!(user.role, TurnRole::User);
        assert_eq!(user.text, "Hello");

        let assistant = Turn::assistant("Hi there");
        assert_eq!(assistant.role, TurnRole::Assistant);
    }

    #[test]
    fn test_role_display_matches_wire_names() {
        assert_eq!(TurnRole::User.to_string(), "user");
        assert_eq!(TurnRole::Assistant.to_string(), "assistant");
        assert_eq!(
            serde_json::to_string(&TurnRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            "OpenAI_Compatible".parse::<ProviderKind>().unwrap(),
            ProviderKind::OpenAiCompatible
        );
        assert_eq!(
            "anthropic".parse::<ProviderKind>().unwrap(),
            ProviderKind::Anthropic
        );

        let err = "gemini".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_request_overrides() {
        let request = GenerationRequest::new("sys", vec![Turn::user("q")])
            .with_temperature(0.1)
            .with_max_tokens(50);
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(50));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1"
        );
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
    }
}
