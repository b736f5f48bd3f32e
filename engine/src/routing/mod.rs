//! Routing Engine
//!
//! Selects exactly one agent for an objective in two ordered passes:
//!
//! 1. **Keyword pass**: routes in configured order, skipping routes without
//!    keywords; the first route with a keyword contained in the objective
//!    (case-insensitive) wins. No model call is made.
//! 2. **Model pass**: the classification model is asked to name a route and
//!    its answer is parsed by [`classifier::parse_classification`].
//!
//! Any failure in the model pass (backend error, timeout, unusable answer)
//! selects the last route, the catch-all. `choose_agent` never fails.

pub mod classifier;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{validate_routes, Config};
use crate::llm::{GenerationRequest, ModelBackend, ModelRegistry, Result, Turn};
use sdk::errors::EngineError;

use classifier::{
    build_classification_prompt, parse_classification, route_name_pattern,
    CLASSIFICATION_MAX_TOKENS, CLASSIFICATION_TEMPERATURE,
};

/// One entry of the routing table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// Agent name this route dispatches to
    pub name: String,

    /// Trigger keywords, matched as case-insensitive substrings
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Human-readable description shown to the classification model
    #[serde(default)]
    pub description: String,
}

impl RouteDefinition {
    pub fn new(
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            description: description.into(),
        }
    }
}

/// Which pass produced a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPass {
    Keyword,
    Classification,
    Fallback,
}

/// Hybrid keyword and model-assisted router
pub struct RoutingEngine {
    routes: Vec<RouteDefinition>,
    name_pattern: Regex,
    classifier: Arc<dyn ModelBackend>,
    classification_timeout: Duration,
}

impl RoutingEngine {
    /// Create a routing engine
    ///
    /// # Errors
    ///
    /// `EngineError::Configuration` if the route table is empty, has
    /// duplicate names, or its last route has keywords.
    pub fn new(
        routes: Vec<RouteDefinition>,
        classifier: Arc<dyn ModelBackend>,
        classification_timeout: Duration,
    ) -> Result<Self> {
        validate_routes(&routes)?;
        let name_pattern = route_name_pattern(&routes)
            .map_err(|e| EngineError::config(format!("Invalid route names: {}", e)))?;

        Ok(Self {
            routes,
            name_pattern,
            classifier,
            classification_timeout,
        })
    }

    /// Build the routing engine described by `config`
    ///
    /// Only the `routing.model` client is created, so agents' credentials are
    /// not needed to route.
    pub fn from_config(config: &Config, registry: &mut ModelRegistry) -> Result<Self> {
        let classifier: Arc<dyn ModelBackend> = registry.client(&config.routing.model)?;
        Self::new(
            config.routing.routes.clone(),
            classifier,
            Duration::from_secs(config.routing.classification_timeout_secs),
        )
    }

    /// Route names in configured order
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }

    /// The last configured route
    pub fn catch_all(&self) -> &RouteDefinition {
        // validate_routes guarantees at least one route
        &self.routes[self.routes.len() - 1]
    }

    /// First route with a keyword contained in `objective`
    pub fn keyword_match(&self, objective: &str) -> Option<&RouteDefinition> {
        let objective = objective.to_lowercase();
        self.routes.iter().find(|route| {
            route
                .keywords
                .iter()
                .any(|keyword| objective.contains(&keyword.to_lowercase()))
        })
    }

    /// Select the agent for `objective`
    pub async fn choose_agent(&self, objective: &str) -> String {
        let (route, pass) = self.decide(objective).await;
        info!(route = %route.name, pass = ?pass, "Routed objective");
        route.name.clone()
    }

    async fn decide(&self, objective: &str) -> (&RouteDefinition, RoutingPass) {
        if let Some(route) = self.keyword_match(objective) {
            return (route, RoutingPass::Keyword);
        }

        match tokio::time::timeout(self.classification_timeout, self.classify(objective)).await {
            Ok(Ok(response)) => {
                match parse_classification(&response, &self.routes, &self.name_pattern) {
                    Some(route) => (route, RoutingPass::Classification),
                    None => {
                        debug!(response = %response, "Classification named no route");
                        (self.catch_all(), RoutingPass::Fallback)
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Classification failed, using catch-all");
                (self.catch_all(), RoutingPass::Fallback)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.classification_timeout.as_secs(),
                    "Classification timed out, using catch-all"
                );
                (self.catch_all(), RoutingPass::Fallback)
            }
        }
    }

    async fn classify(&self, objective: &str) -> Result<String> {
        let request = GenerationRequest::new(
            build_classification_prompt(&self.routes),
            vec![Turn::user(format!("Objective: {}", objective))],
        )
        .with_temperature(CLASSIFICATION_TEMPERATURE)
        .with_max_tokens(CLASSIFICATION_MAX_TOKENS);

        self.classifier.generate(&request).await
    }
}
