//! Tool System
//!
//! A tool takes one string argument and returns one string. Tools swallow their
//! own failures and describe them in the returned text, so invoking a tool
//! never fails from the loop's point of view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool definition shown to the model and the API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier, as the model names it in `function`
    pub name: String,

    /// One-line description (shown to LLM)
    pub description: String,

    /// Name of the single argument, e.g. `city`
    pub argument: String,

    /// Whether tool has side effects
    #[serde(default)]
    pub has_side_effects: bool,
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Run the tool. Errors are reported in the returned text.
    async fn invoke(&self, input: &str) -> String;
}

/// Result of looking a tool up by name
pub enum ToolLookup {
    Found(Arc<dyn Tool>),
    NotFound(Option<String>),
}

/// Registry for available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_shared(Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Total lookup for a name the model may or may not have supplied
    pub fn resolve(&self, name: Option<&str>) -> ToolLookup {
        match name.and_then(|n| self.get(n)) {
            Some(tool) => ToolLookup::Found(tool),
            None => ToolLookup::NotFound(name.map(str::to_owned)),
        }
    }

    /// Get all tool schemas, sorted by name
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate the "Available tools" section of the instruction block
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("Available tools:\n");
        for schema in self.schemas() {
            prompt.push_str(&format!(
                "- {}({}): {}\n",
                schema.name, schema.argument, schema.description
            ));
        }
        prompt
    }
}
