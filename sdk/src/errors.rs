//! Error types and handling
//!
//! This module provides the error types used throughout the Switchyard engine.
//! All errors implement the `SwitchyardErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry credentials. Provider response bodies are kept
//! in `TransportError::Status` for diagnostics but are not part of the hint.

use thiserror::Error;

/// Trait for Switchyard error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait SwitchyardErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, response bodies or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried as-is. Non-recoverable errors need a
    /// configuration change or a different request.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: missing or invalid provider/agent/route setup
/// - **Transport**: a remote model call failed, timed out or returned a
///   payload without text
/// - **Lookup**: an agent or model name is not configured
///
/// Routing classification failures never appear here: the router absorbs
/// them and selects the catch-all route.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, SwitchyardErrorExt, TransportError};
///
/// let error = EngineError::Transport(TransportError::Timeout);
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Lookup("agent 'ghost' not found".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Lookup error: {0}")]
    Lookup(String),
}

impl EngineError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }
}

/// Failure of a single outbound model request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced an HTTP response
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request or the overall deadline expired
    #[error("request timed out")]
    Timeout,

    /// The response was not the shape the provider documents
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl SwitchyardErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Configuration(_) => "Check your config.toml for errors and missing API keys",
            Self::Transport(inner) => inner.user_hint(),
            Self::Lookup(_) => "Use 'switchyard agents' to list the configured agents",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(inner) => inner.is_recoverable(),
            Self::Configuration(_) | Self::Lookup(_) => false,
        }
    }
}

impl SwitchyardErrorExt for TransportError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Network(_) => "Model provider unreachable. Check your network and base_url",
            Self::Status { status, .. } if *status == 401 || *status == 403 => {
                "Model provider rejected the credentials. Check the api_key"
            }
            Self::Status { status: 429, .. } => "Model provider rate limit hit. Try again later",
            Self::Status { .. } => "Model provider rejected the request",
            Self::Timeout => "Model provider took too long to respond. Try again",
            Self::MalformedResponse(_) => "Model provider returned an unexpected response",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Network(_) | Self::Timeout | Self::MalformedResponse(_) => true,
        }
    }
}
