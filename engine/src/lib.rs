//! Switchyard Engine Library
//!
//! Routes free-text objectives to specialized LLM agents. It is used by both
//! the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Credential handling module
pub mod secrets;

/// Model client abstraction layer
pub mod llm;

/// Agent definitions and runtime
pub mod agent;

/// Keyword and model-assisted routing
pub mod routing;

/// Routing plus execution entry point
pub mod orchestrator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

pub use orchestrator::{ContextProvider, Orchestrator, RunOutcome};
