//! Provider dispatch
//!
//! [`ModelClient`] wraps one configured endpoint. [`ModelRegistry`] hands out
//! shared clients by logical model name so agents bound to the same model
//! reuse one connection pool.

use super::anthropic::AnthropicProvider;
use super::openai::OpenAIProvider;
use super::{http_client, GenerationRequest, ModelBackend, ProviderKind, Result};
use crate::config::ModelEndpointConfig;
use crate::secrets::resolve_api_key;
use async_trait::async_trait;
use sdk::errors::EngineError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A model endpoint bound to its provider protocol
pub enum ModelClient {
    OpenAi {
        kind: ProviderKind,
        provider: OpenAIProvider,
    },
    Anthropic(AnthropicProvider),
}

impl ModelClient {
    /// Build a client from an endpoint configuration
    ///
    /// Fails with `EngineError::Configuration` when the provider is unknown,
    /// the API key is missing, or an `openai_compatible` endpoint has no
    /// `base_url`. No network traffic happens here.
    pub fn from_config(config: &ModelEndpointConfig) -> Result<Self> {
        let kind: ProviderKind = config.provider.parse()?;
        let api_key = resolve_api_key(config)?;
        let client = http_client(config.timeout_secs)?;

        match kind {
            ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => Ok(Self::OpenAi {
                kind,
                provider: OpenAIProvider::new(kind, config.clone(), api_key, client)?,
            }),
            ProviderKind::Anthropic => Ok(Self::Anthropic(AnthropicProvider::new(
                config.clone(),
                api_key,
                client,
            ))),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi { kind, .. } => *kind,
            Self::Anthropic(_) => ProviderKind::Anthropic,
        }
    }

    pub fn config(&self) -> &ModelEndpointConfig {
        match self {
            Self::OpenAi { provider, .. } => provider.config(),
            Self::Anthropic(provider) => provider.config(),
        }
    }
}

#[async_trait]
impl ModelBackend for ModelClient {
    fn name(&self) -> &str {
        match self.kind() {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenAiCompatible => "openai_compatible",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.turns.is_empty() {
            return Err(EngineError::config(
                "A generation request needs at least one turn",
            ));
        }

        debug!(
            provider = self.name(),
            model = %self.config().model,
            turns = request.turns.len(),
            "Calling model"
        );

        match self {
            Self::OpenAi { provider, .. } => provider.generate(request).await,
            Self::Anthropic(provider) => provider.generate(request).await,
        }
    }
}

/// Lazily built, shared model clients keyed by logical name
pub struct ModelRegistry {
    endpoints: BTreeMap<String, ModelEndpointConfig>,
    clients: HashMap<String, Arc<ModelClient>>,
}

impl ModelRegistry {
    pub fn new(endpoints: BTreeMap<String, ModelEndpointConfig>) -> Self {
        Self {
            endpoints,
            clients: HashMap::new(),
        }
    }

    /// Get the client for `name`, building it on first use
    pub fn client(&mut self, name: &str) -> Result<Arc<ModelClient>> {
        if let Some(client) = self.clients.get(name) {
            return Ok(Arc::clone(client));
        }

        let endpoint = self
            .endpoints
            .get(name)
            .ok_or_else(|| EngineError::lookup(format!("Model '{}' is not configured", name)))?;

        let client = Arc::new(ModelClient::from_config(endpoint)?);
        self.clients.insert(name.to_string(), Arc::clone(&client));
        Ok(client)
    }
}
