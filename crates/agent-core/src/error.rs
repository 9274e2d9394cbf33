//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Completion body was not a JSON object
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Maximum iterations reached in the agent loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// No session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Stable machine-readable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            AgentError::Provider(_) => "PROVIDER_ERROR",
            AgentError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            AgentError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AgentError::MaxIterations(_) => "MAX_ITERATIONS",
            AgentError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AgentError::Config(_) => "CONFIG_ERROR",
            AgentError::RateLimited(_) => "RATE_LIMITED",
            AgentError::Auth(_) => "AUTH_FAILED",
            AgentError::Json(_) => "JSON_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            AgentError::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            AgentError::MalformedResponse(_) => "The AI service replied with something that is not a JSON object.".into(),
            AgentError::MaxIterations(_) => "The request took too many steps. Please try a simpler query.".into(),
            AgentError::SessionNotFound(id) => format!("Session '{id}' does not exist."),
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            AgentError::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(AgentError::MalformedResponse("x".into()).code(), "MALFORMED_RESPONSE");
        assert_eq!(AgentError::SessionNotFound("abc".into()).code(), "SESSION_NOT_FOUND");

        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(AgentError::from(bad).code(), "JSON_ERROR");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AgentError::SessionNotFound("abc".into()).user_message(),
            "Session 'abc' does not exist."
        );
        assert_eq!(
            AgentError::Config("x".into()).user_message(),
            "An unexpected error occurred."
        );
    }
}
