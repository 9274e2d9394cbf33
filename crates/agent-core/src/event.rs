//! Presentation Events
//!
//! The agent loop never renders anything itself. It emits [`AgentEvent`]s
//! into a [`Presenter`], which decides how they reach the user.

use serde::{Deserialize, Serialize};

use crate::preview::{CodeLanguage, PreviewDocument};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Informational: the model's plan
    Plan { content: String },

    /// Informational: a tool is about to be called
    Action { function: Option<String>, input: String },

    /// Success: a tool returned
    ToolOutput { tool: String, output: String },

    /// Error: the model asked for a tool that does not exist
    UnknownTool { function: Option<String> },

    /// Success: final answer text
    Output { content: String },

    /// A generated file, tagged for highlighting
    File {
        name: String,
        language: CodeLanguage,
        content: String,
    },

    /// Composite document for the inline preview frame
    Preview(PreviewDocument),

    /// Warning: the reply had no step the loop can follow
    Unhandled { step: Option<String> },
}

impl AgentEvent {
    /// One-line rendering for logs and plain terminals
    pub fn summary(&self) -> String {
        match self {
            AgentEvent::Plan { content } => format!("PLAN: {content}"),
            AgentEvent::Action { function, input } => format!(
                "ACTION: Calling {} with input: {input}",
                function.as_deref().unwrap_or("<none>")
            ),
            AgentEvent::ToolOutput { output, .. } => format!("OUTPUT: {output}"),
            AgentEvent::UnknownTool { function } => format!(
                "Unknown tool requested: {}",
                function.as_deref().unwrap_or("<none>")
            ),
            AgentEvent::Output { content } => format!("OUTPUT: {content}"),
            AgentEvent::File { name, language, .. } => format!("FILE: {name} ({language:?})"),
            AgentEvent::Preview(doc) => format!("PREVIEW: {} bytes", doc.html.len()),
            AgentEvent::Unhandled { .. } => "Unhandled step or format.".into(),
        }
    }
}

/// Sink for presentation events
pub trait Presenter: Send {
    fn present(&mut self, event: AgentEvent);
}

/// Collects events in order
impl Presenter for Vec<AgentEvent> {
    fn present(&mut self, event: AgentEvent) {
        self.push(event);
    }
}
