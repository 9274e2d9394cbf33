//! Error Types for the builtin tools
//!
//! These never leave a tool: `invoke` renders them into the result text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Command '{command}' timed out after {limit:?}")]
    Timeout { command: String, limit: std::time::Duration },

    #[error("{0}")]
    Spawn(#[from] std::io::Error),
}
