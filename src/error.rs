//! Error types for toolchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for toolchat operations
///
/// Covers configuration loading, provider calls, tool execution, the
/// completion service contract, and the human input channel.
#[derive(Error, Debug)]
pub enum ToolchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, malformed responses, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// The model asked for a tool that is not registered
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A completion attempt did not finish within the configured limit
    #[error("Completion timed out after {seconds} seconds")]
    CompletionTimeout {
        /// The configured timeout that elapsed
        seconds: u64,
    },

    /// The completion service returned a response that breaks its contract
    /// (for example a tool call without a matching result)
    #[error("Completion service contract violation: {0}")]
    ContractViolation(String),

    /// The human input channel was closed (EOF or interrupt)
    #[error("Input channel closed")]
    InputClosed,

    /// The human input channel failed for another reason
    #[error("Input error: {0}")]
    Input(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for toolchat operations
///
/// Uses `anyhow::Error` so call sites can attach context; the concrete
/// [`ToolchatError`] kind is recovered with `downcast_ref` where it matters.
pub type Result<T> = anyhow::Result<T>;

/// Returns true if `err` wraps [`ToolchatError::InputClosed`]
pub fn is_input_closed(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ToolchatError>(),
        Some(ToolchatError::InputClosed)
    )
}
