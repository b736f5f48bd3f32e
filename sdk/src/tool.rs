//! Agent tool trait and tool sets
//!
//! A tool is a named capability an agent can call with a free-text query and
//! a JSON context object. Tools are synchronous and infallible from the
//! agent's point of view: whatever they have to say, including failures, is
//! returned as text.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Trait that all agent tools must implement
pub trait AgentTool: Send + Sync {
    /// Run the tool against a query and its context
    fn call(&self, query: &str, context: &Value) -> String;
}

impl<F> AgentTool for F
where
    F: Fn(&str, &Value) -> String + Send + Sync,
{
    fn call(&self, query: &str, context: &Value) -> String {
        self(query, context)
    }
}

/// Named mapping from tool name to tool
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: HashMap<String, Arc<dyn AgentTool>>,
}

impl ToolSet {
    /// Create an empty tool set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under `name`, replacing any previous tool of that name
    pub fn register(&mut self, name: impl Into<String>, tool: impl AgentTool + 'static) {
        self.tools.insert(name.into(), Arc::new(tool));
    }

    /// Builder-style variant of [`ToolSet::register`]
    pub fn with(mut self, name: impl Into<String>, tool: impl AgentTool + 'static) -> Self {
        self.register(name, tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .finish()
    }
}
