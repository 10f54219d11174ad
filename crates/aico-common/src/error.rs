//! AICO Common Error Types
//!
//! Centralized error handling for all AICO components

use thiserror::Error;

/// Main error type for AICO operations
#[derive(Debug, Error)]
pub enum AicoError {
    /// No agent is registered under the given id
    #[error("Agent {0} not found")]
    AgentNotFound(String),

    /// An agent with the same id is already registered
    #[error("Agent with ID {0} already exists")]
    DuplicateAgent(String),

    #[error("Workflow {0} not found")]
    WorkflowNotFound(String),

    #[error("Workflow {0} is not active")]
    WorkflowInactive(String),

    #[error("Workflow execution {0} not found")]
    ExecutionNotFound(String),

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Project {0} not found")]
    ProjectNotFound(String),

    #[error("Project template {0} not found")]
    TemplateNotFound(String),

    /// A routing rule carried a pattern that does not compile
    #[error("Invalid routing pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A role name that does not map to any known role
    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    /// A message whose content does not match what its type requires
    #[error("Invalid message payload: {0}")]
    InvalidPayload(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience result type for AICO operations
pub type Result<T> = std::result::Result<T, AicoError>;
