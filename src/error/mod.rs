//! Error types for Compass.

use thiserror::Error;

use crate::session::TurnState;

/// Primary error type for all Compass operations.
///
/// Per-tool failures never surface here: they are converted into
/// [`crate::types::ToolInvocationResult`] error outcomes by the executor.
/// Only transport failures and caller misuse reach this type.
#[derive(Error, Debug)]
pub enum CompassError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Model turn failed: {0}")]
    ModelTurn(String),

    #[error("Turn in progress (state: {state})")]
    TurnInProgress { state: TurnState },

    #[error("No pending action with id {message_id}")]
    NoPendingAction { message_id: String },

    #[error("Action {message_id} has already been resolved")]
    AlreadyResolved { message_id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse classification used by callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Model endpoint or network failed; the turn was aborted.
    Transport,
    /// Credentials are missing or were rejected.
    Authentication,
    /// The caller invoked an operation the session state does not allow.
    Misuse,
    Configuration,
    Serialization,
    Unknown,
}

impl CompassError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::ModelTurn(_) | Self::Io(_) => ErrorCategory::Transport,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                _ => ErrorCategory::Transport,
            },
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::TurnInProgress { .. }
            | Self::NoPendingAction { .. }
            | Self::AlreadyResolved { .. }
            | Self::InvalidArgument(_) => ErrorCategory::Misuse,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::UnknownTool(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error aborted a model turn (as opposed to being rejected up front).
    pub fn is_turn_failure(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transport | ErrorCategory::Authentication)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CompassError>;
