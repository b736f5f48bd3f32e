//! Switchyard SDK
//!
//! Shared library providing the error taxonomy and the agent tool contract.
//! This crate is used by the engine and by anything that plugs tools or
//! context into it.

/// Error types and handling
pub mod errors;

/// Agent tool trait and tool sets
pub mod tool;

// Re-export commonly used types
pub use errors::{EngineError, SwitchyardErrorExt, TransportError};
pub use tool::{AgentTool, ToolSet};
