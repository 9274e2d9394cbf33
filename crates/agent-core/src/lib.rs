//! # agent-core
//!
//! Step-tagged agent loop with a provider-agnostic LLM abstraction and a small
//! tool registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Agent                              │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Step Loop  │──│    Tools    │  │   LlmProvider        │  │
//! │  │ plan/action │  │   Registry  │  │   (Strategy)         │  │
//! │  │ observe/out │──┴─────────────┴──│                      │  │
//! │  └──────┬──────┘                   └──────────────────────┘  │
//! │         │ AgentEvent                                         │
//! │  ┌──────▼──────┐                                             │
//! │  │  Presenter  │  notices, code blocks, inline preview       │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The model must answer every request with one JSON object whose `step` field
//! says what it wants next. See [`step`] for the wire shape.

pub mod error;
pub mod event;
pub mod message;
pub mod preview;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod step;
pub mod tool;

pub use error::{AgentError, Result};
pub use event::{AgentEvent, Presenter};
pub use message::{Conversation, Message, Role};
pub use preview::{CodeLanguage, GeneratedFiles, PreviewDocument};
pub use provider::{GenerationOptions, LlmProvider, ScriptedProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, QueryOutcome, QueryStatus};
pub use session::{MemorySessionStore, Session, SessionId};
pub use step::{Step, StepError};
pub use tool::{Tool, ToolLookup, ToolRegistry, ToolSchema};
