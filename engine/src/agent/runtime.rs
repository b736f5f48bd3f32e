//! Agent Runtime
//!
//! Binds an [`AgentSpec`] to a model backend and runs one objective. Every
//! turn sent to the model has the user role:
//!
//! 1. `Objective:` with the objective text
//! 2. `Working notes so far:` with the notes, or `(none)` when empty
//! 3. `Relevant context from files:` only when context is non-empty
//! 4. `Hints:` only when hints are present and non-empty
//!
//! Errors from the backend propagate unchanged. There are no retries here.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::llm::{GenerationRequest, ModelBackend, Result, Turn};
use sdk::ToolSet;

/// Placeholder sent when an agent has no working notes yet
pub const EMPTY_NOTES_PLACEHOLDER: &str = "(none)";

/// Immutable definition of one agent
#[derive(Clone)]
pub struct AgentSpec {
    /// Agent name, equal to its route name
    pub name: String,

    /// System prompt sent on every call
    pub system_prompt: String,

    /// Logical model name from the `models` table
    pub model_name: String,

    /// Optional tools the agent may call
    pub tools: Option<ToolSet>,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model_name: model_name.into(),
            tools: None,
        }
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = Some(tools);
        self
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("name", &self.name)
            .field("model_name", &self.model_name)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

/// An agent bound to the backend it calls
pub struct AgentRuntime {
    spec: AgentSpec,
    backend: Arc<dyn ModelBackend>,
}

impl AgentRuntime {
    pub fn new(spec: AgentSpec, backend: Arc<dyn ModelBackend>) -> Self {
        Self { spec, backend }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Run one objective and return the model's text
    ///
    /// # Arguments
    /// * `objective` - what the user asked for
    /// * `working_notes` - notes carried from earlier steps, may be empty
    /// * `retrieved_context` - supplementary material, skipped when empty
    /// * `hints` - extra guidance, skipped when absent or empty
    pub async fn run(
        &self,
        objective: &str,
        working_notes: &str,
        retrieved_context: &str,
        hints: Option<&str>,
    ) -> Result<String> {
        let turns = build_turns(objective, working_notes, retrieved_context, hints);

        debug!(
            agent = %self.spec.name,
            backend = self.backend.name(),
            turns = turns.len(),
            "Running agent"
        );

        let request = GenerationRequest::new(self.spec.system_prompt.clone(), turns);
        self.backend.generate(&request).await
    }

    /// Invoke a registered tool
    ///
    /// Returns an empty string when the agent has no tools or no tool is
    /// registered under `tool_name`.
    pub fn call_tool(&self, tool_name: &str, query: &str, context: &Value) -> String {
        match self.spec.tools.as_ref().and_then(|tools| tools.get(tool_name)) {
            Some(tool) => tool.call(query, context),
            None => String::new(),
        }
    }
}

/// Build the user turns for one run
pub fn build_turns(
    objective: &str,
    working_notes: &str,
    retrieved_context: &str,
    hints: Option<&str>,
) -> Vec<Turn> {
    let notes = if working_notes.is_empty() {
        EMPTY_NOTES_PLACEHOLDER
    } else {
        working_notes
    };

    let mut turns = vec![
        Turn::user(format!("Objective:\n{}", objective)),
        Turn::user(format!("Working notes so far:\n{}", notes)),
    ];

    if !retrieved_context.is_empty() {
        turns.push(Turn::user(format!(
            "Relevant context from files:\n{}",
            retrieved_context
        )));
    }

    if let Some(hints) = hints.filter(|h| !h.is_empty()) {
        turns.push(Turn::user(format!("Hints:\n{}", hints)));
    }

    turns
}
