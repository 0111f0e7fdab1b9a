//! Error types for the agent system

use thiserror::Error;

/// Errors raised while building or running a worker
#[derive(Debug, Error)]
pub enum AgentError {
    /// No worker registered under a route label
    #[error("Agent not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Required input (such as an image) is absent or unreadable
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Timeout
    #[error("Operation timed out after {0}s")]
    Timeout(u64),
}

/// Errors specific to LLM provider operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// API error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

/// Errors surfaced by a dispatch run
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The supervisor produced a label outside the route set
    #[error("Unknown routing label: {label:?}")]
    Routing { label: String },

    /// A worker's required input is missing
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// An LLM or tool backend failed, or a worker timed out
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Dispatch was started without any messages
    #[error("Conversation has no messages")]
    EmptyConversation,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<AgentError> for DispatchError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::MissingInput(reason) => DispatchError::MissingInput(reason),
            AgentError::NotFound(name) => DispatchError::Routing { label: name },
            other => DispatchError::Upstream(other.to_string()),
        }
    }
}

impl From<LlmError> for DispatchError {
    fn from(err: LlmError) -> Self {
        DispatchError::Upstream(err.to_string())
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_keeps_its_kind() {
        let err: DispatchError = AgentError::MissingInput("no image".to_string()).into();
        assert!(matches!(err, DispatchError::MissingInput(reason) if reason == "no image"));
    }

    #[test]
    fn llm_and_timeout_failures_are_upstream() {
        let llm: DispatchError = AgentError::Llm(LlmError::Timeout).into();
        assert!(matches!(llm, DispatchError::Upstream(_)));

        let timeout: DispatchError = AgentError::Timeout(30).into();
        assert!(matches!(timeout, DispatchError::Upstream(msg) if msg.contains("30s")));
    }

    #[test]
    fn unknown_worker_is_a_routing_failure() {
        let err: DispatchError = AgentError::NotFound("rag_agent".to_string()).into();
        assert!(matches!(err, DispatchError::Routing { label } if label == "rag_agent"));
    }
}
