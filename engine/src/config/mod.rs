//! Configuration management
//!
//! This module handles loading, validation, and management of the Switchyard
//! configuration. Configuration is stored in TOML format at
//! ~/.switchyard/config.toml unless another path is given.
//!
//! # Configuration Sections
//!
//! - **core**: log level and per-request deadline
//! - **models**: named model endpoints (`primary`, `routing_model`, ...)
//! - **routing**: the classification model and the ordered route table
//! - **agents**: per-agent system prompt, model and hints
//!
//! # Credential Expansion
//!
//! `${VAR}` references in `api_key` and `base_url` are replaced with the value
//! of the environment variable `VAR`. Unset variables are left untouched, so
//! the model client later reports the credential as missing.
//!
//! # Examples
//!
//! ```no_run
//! use switchyard_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_default()?;
//!
//! for route in &config.routing.routes {
//!     println!("{}: {}", route.name, route.description);
//! }
//! # Ok(())
//! # }
//! ```

use regex::Regex;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::llm::ProviderKind;
use crate::routing::RouteDefinition;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Model endpoints keyed by logical name
    pub models: BTreeMap<String, ModelEndpointConfig>,

    /// Routing table and classification model
    pub routing: RoutingConfig,

    /// Agent definitions keyed by agent name
    pub agents: BTreeMap<String, AgentConfig>,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound for one `Orchestrator::run`, routing included
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_deadline_secs: default_request_deadline(),
        }
    }
}

/// One remote model endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelEndpointConfig {
    /// Provider kind (openai, openai_compatible, anthropic)
    pub provider: String,

    /// Provider-side model identifier
    pub model: String,

    /// API key, usually a `${VAR}` reference
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override (enterprise gateways, compatible servers)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Default output token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request transport timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ModelEndpointConfig {
    /// Create an endpoint config with default sampling settings
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Model used for classification when no keyword matches
    #[serde(default = "default_routing_model")]
    pub model: String,

    /// Upper bound for the classification call
    #[serde(default = "default_classification_timeout")]
    pub classification_timeout_secs: u64,

    /// Ordered routes; the last one is the catch-all
    pub routes: Vec<RouteDefinition>,
}

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model name from the `models` table
    #[serde(default = "default_agent_model")]
    pub model: String,

    /// Inline system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// System prompt file, relative to the config file
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,

    /// Extra guidance appended as a hints turn
    #[serde(default)]
    pub hints: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_deadline() -> u64 {
    300
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout() -> u64 {
    120
}

fn default_routing_model() -> String {
    "primary".to_string()
}

fn default_agent_model() -> String {
    "primary".to_string()
}

fn default_classification_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from the default location (~/.switchyard/config.toml)
    ///
    /// There is no default route table, so a missing file is an error.
    pub fn load_default() -> Result<Self, EngineError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            return Err(EngineError::config(format!(
                "No configuration found at {:?}. Create it or pass --config",
                path
            )));
        }
        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    ///
    /// `system_prompt_file` entries are resolved relative to the directory
    /// holding the config file and inlined into `system_prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - A prompt file cannot be read
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::config(format!("Failed to read config file: {}", e)))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&contents, base_dir)
    }

    /// Parse configuration from a TOML string
    ///
    /// Relative prompt files resolve against the current directory.
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        Self::parse(contents, Path::new("."))
    }

    fn parse(contents: &str, base_dir: &Path) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::config(format!("Failed to parse config: {}", e)))?;

        config.expand_credentials();
        config.inline_prompt_files(base_dir)?;
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.switchyard/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::config("Could not determine home directory"))?;

        Ok(home.join(".switchyard").join("config.toml"))
    }

    /// Look up a model endpoint by logical name
    pub fn model(&self, name: &str) -> Result<&ModelEndpointConfig, EngineError> {
        self.models
            .get(name)
            .ok_or_else(|| EngineError::lookup(format!("Model '{}' not found in settings", name)))
    }

    fn expand_credentials(&mut self) {
        for model in self.models.values_mut() {
            model.api_key = model.api_key.as_deref().map(expand_env);
            model.base_url = model.base_url.as_deref().map(expand_env);
        }
    }

    fn inline_prompt_files(&mut self, base_dir: &Path) -> Result<(), EngineError> {
        for (name, agent) in self.agents.iter_mut() {
            match (&agent.system_prompt, &agent.system_prompt_file) {
                (Some(_), Some(_)) => {
                    return Err(EngineError::config(format!(
                        "Agent '{}' sets both system_prompt and system_prompt_file",
                        name
                    )));
                }
                (None, Some(file)) => {
                    let path = if file.is_absolute() {
                        file.clone()
                    } else {
                        base_dir.join(file)
                    };
                    let prompt = fs::read_to_string(&path).map_err(|e| {
                        EngineError::config(format!(
                            "Failed to read system prompt for agent '{}' from {:?}: {}",
                            name, path, e
                        ))
                    })?;
                    agent.system_prompt = Some(prompt.trim().to_string());
                    agent.system_prompt_file = None;
                }
                (None, None) => {
                    return Err(EngineError::config(format!(
                        "Agent '{}' needs a system_prompt or system_prompt_file",
                        name
                    )));
                }
                (Some(_), None) => {}
            }
        }
        Ok(())
    }

    /// Validate the loaded configuration
    ///
    /// Checks everything that can be checked without network access: field
    /// ranges, provider names, route table shape and cross references.
    fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.core.request_deadline_secs == 0 {
            return Err(EngineError::config(
                "request_deadline_secs must be greater than 0",
            ));
        }

        if self.routing.classification_timeout_secs == 0 {
            return Err(EngineError::config(
                "classification_timeout_secs must be greater than 0",
            ));
        }

        if self.models.is_empty() {
            return Err(EngineError::config("At least one model must be configured"));
        }

        for (name, model) in &self.models {
            model.provider.parse::<ProviderKind>()?;

            if !(0.0..=2.0).contains(&model.temperature) {
                return Err(EngineError::config(format!(
                    "Model '{}': temperature must be between 0.0 and 2.0",
                    name
                )));
            }
            if model.max_tokens == 0 {
                return Err(EngineError::config(format!(
                    "Model '{}': max_tokens must be greater than 0",
                    name
                )));
            }
            if model.timeout_secs == 0 {
                return Err(EngineError::config(format!(
                    "Model '{}': timeout_secs must be greater than 0",
                    name
                )));
            }
        }

        validate_routes(&self.routing.routes)?;
        self.model(&self.routing.model)?;

        for route in &self.routing.routes {
            if !self.agents.contains_key(&route.name) {
                return Err(EngineError::config(format!(
                    "Route '{}' has no matching [agents.{}] entry",
                    route.name, route.name
                )));
            }
        }

        for agent in self.agents.values() {
            self.model(&agent.model)?;
        }

        Ok(())
    }
}

/// Check the route table invariants
///
/// The table must be non-empty, route names must be unique ignoring case,
/// keywords must not be blank and the last route (the catch-all) must have
/// no keywords.
pub fn validate_routes(routes: &[RouteDefinition]) -> Result<(), EngineError> {
    let Some(last) = routes.last() else {
        return Err(EngineError::config("At least one route must be configured"));
    };

    if !last.keywords.is_empty() {
        return Err(EngineError::config(format!(
            "The last route '{}' is the catch-all and must not have keywords",
            last.name
        )));
    }

    let mut seen = HashSet::new();
    for route in routes {
        if route.name.trim().is_empty() {
            return Err(EngineError::config("Route names must not be empty"));
        }
        if !seen.insert(route.name.to_lowercase()) {
            return Err(EngineError::config(format!(
                "Duplicate route name '{}'",
                route.name
            )));
        }
        // An empty keyword is a substring of every objective
        if route.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(EngineError::config(format!(
                "Route '{}' has a blank keyword",
                route.name
            )));
        }
    }

    Ok(())
}

static ENV_REFERENCE: OnceLock<Regex> = OnceLock::new();

fn env_reference_pattern() -> &'static Regex {
    ENV_REFERENCE
        .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid env reference pattern"))
}

/// Replace `${VAR}` references with environment values
///
/// References to unset variables are kept verbatim.
pub fn expand_env(value: &str) -> String {
    env_reference_pattern()
        .replace_all(value, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
