//! # agent-runtime
//!
//! Runtime providers for the web-app builder agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): hosted chat completions in JSON mode. Any
//!   OpenAI-compatible endpoint works by pointing `OPENAI_BASE_URL` at it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Session, Tool, ToolRegistry,
};
