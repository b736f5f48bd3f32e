//! Agents
//!
//! An agent is a bound (system prompt, model) pair that turns an objective
//! into a textual artifact. This module holds the immutable agent definition
//! and the runtime that executes it against a model backend.

pub mod runtime;

pub use runtime::{build_turns, AgentRuntime, AgentSpec, EMPTY_NOTES_PLACEHOLDER};
