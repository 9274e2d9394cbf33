//! # webapp-builder
//!
//! The web-app builder: the instruction block that teaches the model the
//! step protocol, and the two builtin tools it may call.
//!
//! ```text
//! get_weather(city)  ── GET wttr.in/{city}?format=%C+%t
//! run_command(cmd)   ── sh -c "{cmd}"   (10 s timeout)
//! ```

pub mod error;
pub mod svckit;

use std::sync::Arc;
use std::time::Duration;

use agent_core::{Tool, ToolRegistry};

pub use error::ToolError;
pub use svckit::{ShellTool, WeatherTool};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::shell::DEFAULT_COMMAND_TIMEOUT;
    pub use crate::svckit::weather::{DEFAULT_WEATHER_URL, WEATHER_FAILURE};
    pub use crate::svckit::{ShellTool, WeatherTool};
}

/// The closed set of tools the model may name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    GetWeather,
    RunCommand,
}

impl BuiltinTool {
    pub const ALL: [Self; 2] = [Self::GetWeather, Self::RunCommand];

    /// Name the model uses in an action step
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetWeather => "get_weather",
            Self::RunCommand => "run_command",
        }
    }

    pub fn build(self, config: &ToolsConfig) -> Arc<dyn Tool> {
        match self {
            Self::GetWeather => Arc::new(WeatherTool::new(config.weather_base_url.clone())),
            Self::RunCommand => Arc::new(ShellTool::new(config.command_timeout)),
        }
    }
}

/// Tool settings
#[derive(Clone, Debug)]
pub struct ToolsConfig {
    pub weather_base_url: String,
    pub command_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_base_url: tools::DEFAULT_WEATHER_URL.into(),
            command_timeout: tools::DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl ToolsConfig {
    /// `WEATHER_BASE_URL` and `COMMAND_TIMEOUT_SECS` over the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            weather_base_url: var("WEATHER_BASE_URL").unwrap_or(defaults.weather_base_url),
            command_timeout: var("COMMAND_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map_or(defaults.command_timeout, Duration::from_secs),
        }
    }
}

/// Registry holding every builtin tool
pub fn builtin_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in BuiltinTool::ALL {
        registry.register_shared(tool.build(config));
    }
    registry
}

/// Instruction block for the web-app builder. Tool descriptions are appended
/// by the agent from the registry.
pub const WEBAPP_BUILDER_PROMPT: &str = r#"You are an AI assistant that builds simple web apps such as todo lists, calculators and similar small tools.
Work in steps: plan, then action and observe as often as needed, then output.
You may generate the files index.html, styles.css and app.js.
Answer every message with exactly one JSON object of this shape:

{
  "step": "plan" | "action" | "observe" | "output",
  "content": "string",
  "function": "tool name, only for action",
  "input": "tool input, only for action"
}

After an action you receive {"step": "observe", "output": "..."} carrying the tool result.

In the output step, return the complete content of every generated file in a "files" object:
{
  "step": "output",
  "content": "Here is your app code.",
  "files": {
    "index.html": "...",
    "styles.css": "...",
    "app.js": "..."
  }
}

The generated files are displayed and previewed inline."#;
