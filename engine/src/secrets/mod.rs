//! Credential handling
//!
//! API keys arrive in the configuration already expanded from the
//! environment. This module decides whether a key is usable and keeps keys
//! out of logs and error messages.

pub mod string;

pub use string::SecretString;

use regex::Regex;
use sdk::errors::EngineError;
use std::sync::OnceLock;

use crate::config::ModelEndpointConfig;

/// Regex patterns for detecting credentials echoed back by providers.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - OpenAI and Anthropic API keys: sk-... / sk-ant-...
/// - Bearer tokens: Bearer\s+[^\s]{20,}
/// - Anthropic-style header echoes: x-api-key: ...
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid API key pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
            Regex::new(r"(?i)x-api-key:\s*[^\s]+").expect("Invalid header pattern"),
        ]
    })
}

/// Resolve the API key of an endpoint
///
/// A key is missing when it is absent, blank, or still holds an unexpanded
/// `${VAR}` reference (the variable was not set when the config was loaded).
///
/// # Errors
///
/// Returns `EngineError::Configuration` naming the endpoint's provider and
/// model, never the key.
pub fn resolve_api_key(config: &ModelEndpointConfig) -> Result<SecretString, EngineError> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() && !key.contains("${") => Ok(SecretString::new(key)),
        Some(key) if key.contains("${") => Err(EngineError::config(format!(
            "API key for {} model '{}' references an unset environment variable",
            config.provider, config.model
        ))),
        _ => Err(EngineError::config(format!(
            "No API key configured for {} model '{}'",
            config.provider, config.model
        ))),
    }
}

/// Replace anything that looks like a credential with `[REDACTED]`
pub fn scrub(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in get_secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").into_owned();
    }
    result
}
