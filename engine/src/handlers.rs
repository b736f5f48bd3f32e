//! Command handlers for CLI operations
//!
//! - run: route an objective and print the agent's answer
//! - route: print the agent an objective would go to
//! - agents: list route names in order

use anyhow::Result;
use serde_json::json;

use crate::config::Config;
use crate::llm::ModelRegistry;
use crate::orchestrator::Orchestrator;
use crate::routing::RoutingEngine;
use sdk::errors::{EngineError, SwitchyardErrorExt};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Route an objective (or use `agent`) and print the answer
pub async fn handle_run(
    objective: String,
    agent: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config).map_err(with_hint)?;

    let outcome = orchestrator
        .run_detailed(&objective, agent.as_deref())
        .await
        .map_err(with_hint)?;

    match format {
        OutputFormat::Text => println!("{}", outcome.output),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

/// Print the agent the router picks for an objective
///
/// Only the routing model is needed; agent credentials are not checked.
pub async fn handle_route(objective: String, config: &Config, format: OutputFormat) -> Result<()> {
    let mut registry = ModelRegistry::new(config.models.clone());
    let routing = RoutingEngine::from_config(config, &mut registry).map_err(with_hint)?;
    let agent = routing.choose_agent(&objective).await;

    match format {
        OutputFormat::Text => println!("{}", agent),
        OutputFormat::Json => {
            let output = json!({
                "objective": objective,
                "agent": agent,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// List configured routes in order
///
/// Reads the configuration only; no model client is built.
pub fn handle_agents(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for route in &config.routing.routes {
                if route.description.is_empty() {
                    println!("{}", route.name);
                } else {
                    println!("{:<20} {}", route.name, route.description);
                }
            }
        }
        OutputFormat::Json => {
            let agents: Vec<_> = config
                .routing
                .routes
                .iter()
                .map(|route| {
                    json!({
                        "name": route.name,
                        "description": route.description,
                        "keywords": route.keywords,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&agents)?);
        }
    }
    Ok(())
}

/// Attach the user-facing hint of an engine error
pub fn with_hint(err: EngineError) -> anyhow::Error {
    let hint = err.user_hint().to_string();
    anyhow::Error::new(err).context(hint)
}
