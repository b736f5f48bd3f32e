//! Orchestrator
//!
//! Single entry point tying routing to execution. An objective is routed
//! (unless the caller names an agent), the chosen agent's context provider
//! runs, then the agent runtime produces the answer. The whole run is bounded
//! by the request deadline.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::{AgentRuntime, AgentSpec};
use crate::config::Config;
use crate::llm::{ModelBackend, ModelRegistry, Result};
use crate::routing::RoutingEngine;
use sdk::errors::{EngineError, TransportError};

/// Default bound for one run
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(300);

/// Supplies agent-specific reference material for an objective
///
/// Runs after the agent is chosen and before it is invoked. The returned text
/// becomes the agent's retrieved context; an empty string adds nothing.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn provide(&self, agent: &str, objective: &str) -> Result<String>;
}

#[async_trait]
impl<F> ContextProvider for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    async fn provide(&self, agent: &str, objective: &str) -> Result<String> {
        Ok(self(agent, objective))
    }
}

/// Result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Agent that produced the output
    pub agent: String,

    /// Text returned by the agent
    pub output: String,
}

struct AgentBinding {
    runtime: AgentRuntime,
    hints: Option<String>,
    context: Option<Arc<dyn ContextProvider>>,
}

/// Routes objectives to agents and runs them
pub struct Orchestrator {
    routing: RoutingEngine,
    agents: HashMap<String, AgentBinding>,
    deadline: Duration,
}

impl Orchestrator {
    /// Create an orchestrator from a routing engine and agent runtimes
    ///
    /// # Errors
    ///
    /// `EngineError::Configuration` if two runtimes share a name or a route
    /// has no runtime.
    pub fn new(routing: RoutingEngine, runtimes: Vec<AgentRuntime>) -> Result<Self> {
        let mut agents = HashMap::with_capacity(runtimes.len());
        for runtime in runtimes {
            let name = runtime.name().to_string();
            let binding = AgentBinding {
                runtime,
                hints: None,
                context: None,
            };
            if agents.insert(name.clone(), binding).is_some() {
                return Err(EngineError::config(format!(
                    "Agent '{}' is defined more than once",
                    name
                )));
            }
        }

        for route in routing.route_names() {
            if !agents.contains_key(route) {
                return Err(EngineError::config(format!(
                    "Route '{}' has no agent runtime",
                    route
                )));
            }
        }

        Ok(Self {
            routing,
            agents,
            deadline: DEFAULT_REQUEST_DEADLINE,
        })
    }

    /// Build the full pipeline from configuration
    ///
    /// Agents that share a model name share one client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = ModelRegistry::new(config.models.clone());
        let routing = RoutingEngine::from_config(config, &mut registry)?;

        let mut runtimes = Vec::with_capacity(config.agents.len());
        let mut hints = Vec::new();
        for (name, agent) in &config.agents {
            let backend: Arc<dyn ModelBackend> = registry.client(&agent.model)?;
            let spec = AgentSpec::new(
                name.clone(),
                agent.system_prompt.clone().unwrap_or_default(),
                agent.model.clone(),
            );
            runtimes.push(AgentRuntime::new(spec, backend));
            if let Some(text) = &agent.hints {
                hints.push((name.as_str(), text.clone()));
            }
        }

        let mut orchestrator = Self::new(routing, runtimes)?
            .with_deadline(Duration::from_secs(config.core.request_deadline_secs));
        for (name, text) in hints {
            orchestrator = orchestrator.with_hints(name, text)?;
        }

        info!(
            agents = orchestrator.agents.len(),
            routes = orchestrator.routing.route_names().len(),
            "Orchestrator ready"
        );
        Ok(orchestrator)
    }

    /// Set the bound for one run
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Attach hints to an agent
    pub fn with_hints(mut self, agent: &str, hints: impl Into<String>) -> Result<Self> {
        self.binding_mut(agent)?.hints = Some(hints.into());
        Ok(self)
    }

    /// Register the context provider of an agent
    pub fn with_context_provider(
        mut self,
        agent: &str,
        provider: impl ContextProvider + 'static,
    ) -> Result<Self> {
        self.binding_mut(agent)?.context = Some(Arc::new(provider));
        Ok(self)
    }

    /// Route names in configured order
    pub fn agent_names(&self) -> Vec<&str> {
        self.routing.route_names()
    }

    /// Run an objective and return the agent's text
    pub async fn run(&self, objective: &str, explicit_agent: Option<&str>) -> Result<String> {
        self.run_detailed(objective, explicit_agent)
            .await
            .map(|outcome| outcome.output)
    }

    /// Run an objective and report which agent answered
    ///
    /// # Errors
    ///
    /// * `EngineError::Lookup` - `explicit_agent` names no agent
    /// * `EngineError::Transport` - the agent's model call failed, or the
    ///   request deadline expired
    pub async fn run_detailed(
        &self,
        objective: &str,
        explicit_agent: Option<&str>,
    ) -> Result<RunOutcome> {
        let span = info_span!("run", request_id = %Uuid::new_v4());

        match tokio::time::timeout(self.deadline, self.execute(objective, explicit_agent))
            .instrument(span.clone())
            .await
        {
            Ok(result) => result,
            Err(_) => {
                span.in_scope(|| {
                    warn!(
                        deadline_secs = self.deadline.as_secs(),
                        "Request deadline expired"
                    )
                });
                Err(TransportError::Timeout.into())
            }
        }
    }

    async fn execute(&self, objective: &str, explicit_agent: Option<&str>) -> Result<RunOutcome> {
        let agent = match explicit_agent {
            Some(name) => {
                info!(agent = name, "Using explicit agent");
                name.to_string()
            }
            None => self.routing.choose_agent(objective).await,
        };

        let binding = self
            .agents
            .get(&agent)
            .ok_or_else(|| EngineError::lookup(format!("Agent '{}' not found", agent)))?;

        let context = match &binding.context {
            Some(provider) => provider.provide(&agent, objective).await?,
            None => String::new(),
        };

        let output = binding
            .runtime
            .run(objective, "", &context, binding.hints.as_deref())
            .await?;

        info!(agent = %agent, output_len = output.len(), "Run complete");
        Ok(RunOutcome { agent, output })
    }

    fn binding_mut(&mut self, agent: &str) -> Result<&mut AgentBinding> {
        self.agents
            .get_mut(agent)
            .ok_or_else(|| EngineError::lookup(format!("Agent '{}' not found", agent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationRequest;
    use crate::routing::RouteDefinition;
    use std::sync::Mutex;

    /// Echoes the joined turn texts, or replays a routing answer
    struct EchoBackend {
        classification: &'static str,
        delay: Duration,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl EchoBackend {
        fn new(classification: &'static str) -> Arc<Self> {
            Arc::new(Self {
                classification,
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                classification: "catchall",
                delay,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            if request.temperature.is_some() {
                return Ok(self.classification.to_string());
            }
            let texts: Vec<&str> = request.turns.iter().map(|t| t.text.as_str()).collect();
            Ok(texts.join("|"))
        }
    }

    fn orchestrator(backend: Arc<EchoBackend>) -> Orchestrator {
        let routes = vec![
            RouteDefinition::new("alpha", ["battery"], "Battery systems"),
            RouteDefinition::new("catchall", Vec::<String>::new(), "Anything else"),
        ];
        let routing = RoutingEngine::new(routes, backend.clone(), Duration::from_secs(5)).unwrap();
        let runtimes = vec![
            AgentRuntime::new(AgentSpec::new("alpha", "You know batteries.", "primary"), backend.clone()),
            AgentRuntime::new(AgentSpec::new("catchall", "You help.", "primary"), backend),
        ];
        Orchestrator::new(routing, runtimes).unwrap()
    }

    #[tokio::test]
    async fn test_keyword_routed_run() {
        let backend = EchoBackend::new("catchall");
        let outcome = orchestrator(backend.clone())
            .run_detailed("Cheaper battery cells", None)
            .await
            .unwrap();

        assert_eq!(outcome.agent, "alpha");
        assert_eq!(
            outcome.output,
            "Objective:\nCheaper battery cells|Working notes so far:\n(none)"
        );
        // Only the agent call, no classification
        assert_eq!(backend.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_classified_run_makes_two_calls() {
        let backend = EchoBackend::new("catchall is best");
        let outcome = orchestrator(backend.clone())
            .run_detailed("Improve seat comfort", None)
            .await
            .unwrap();

        assert_eq!(outcome.agent, "catchall");
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].system_prompt, "You help.");
    }

    #[tokio::test]
    async fn test_explicit_agent_bypasses_routing() {
        let backend = EchoBackend::new("alpha");
        let output = orchestrator(backend.clone())
            .run("Improve seat comfort", Some("alpha"))
            .await
            .unwrap();

        assert!(output.starts_with("Objective:\nImprove seat comfort"));
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt, "You know batteries.");
    }

    #[tokio::test]
    async fn test_unknown_explicit_agent_is_lookup_error() {
        let orchestrator = orchestrator(EchoBackend::new("alpha"));

        let err = orchestrator.run("x", Some("ghost")).await.unwrap_err();
        assert!(matches!(err, EngineError::Lookup(_)));

        // The failure is scoped to that request
        assert!(orchestrator.run("battery", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_context_provider_and_hints() {
        let backend = EchoBackend::new("catchall");
        let orchestrator = orchestrator(backend.clone())
            .with_context_provider("alpha", |agent: &str, _objective: &str| {
                format!("reference tables for {}", agent)
            })
            .unwrap()
            .with_hints("alpha", "Prefer LFP chemistry")
            .unwrap();

        let output = orchestrator.run("battery pack", None).await.unwrap();
        assert_eq!(
            output,
            "Objective:\nbattery pack|Working notes so far:\n(none)|\
             Relevant context from files:\nreference tables for alpha|\
             Hints:\nPrefer LFP chemistry"
        );

        // Catch-all has neither
        let output = orchestrator.run("x", Some("catchall")).await.unwrap();
        assert_eq!(output.split('|').count(), 2);
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let orchestrator = orchestrator(EchoBackend::slow(Duration::from_secs(3600)))
            .with_deadline(Duration::from_millis(50));

        let err = orchestrator.run("battery", None).await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(TransportError::Timeout)));
    }

    #[test]
    fn test_construction_checks() {
        let backend = EchoBackend::new("catchall");
        let routes = vec![
            RouteDefinition::new("alpha", ["battery"], ""),
            RouteDefinition::new("catchall", Vec::<String>::new(), ""),
        ];

        let routing = RoutingEngine::new(routes.clone(), backend.clone(), Duration::from_secs(1)).unwrap();
        let missing = vec![AgentRuntime::new(AgentSpec::new("alpha", "", "primary"), backend.clone())];
        assert!(matches!(
            Orchestrator::new(routing, missing).err(),
            Some(EngineError::Configuration(_))
        ));

        let routing = RoutingEngine::new(routes, backend.clone(), Duration::from_secs(1)).unwrap();
        let duplicated = vec![
            AgentRuntime::new(AgentSpec::new("alpha", "", "primary"), backend.clone()),
            AgentRuntime::new(AgentSpec::new("alpha", "", "primary"), backend.clone()),
            AgentRuntime::new(AgentSpec::new("catchall", "", "primary"), backend),
        ];
        assert!(matches!(
            Orchestrator::new(routing, duplicated).err(),
            Some(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_agent_names_and_unknown_bindings() {
        let orchestrator = orchestrator(EchoBackend::new("catchall"));
        assert_eq!(orchestrator.agent_names(), vec!["alpha", "catchall"]);

        assert!(matches!(
            orchestrator.with_hints("ghost", "x").err(),
            Some(EngineError::Lookup(_))
        ));
    }
}
