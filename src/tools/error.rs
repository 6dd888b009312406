//! Per-tool failures.
//!
//! These never abort a turn. The executor renders them into error results
//! whose text is what the model reads back.

use thiserror::Error;

use super::calendar::CalendarError;

/// Text handed to the model when the calendar token is missing or rejected.
pub const CALENDAR_PERMISSION_TEXT: &str = "PERMISSION DENIED: I do not have permission to access your calendar yet. Please instruct the user to \"Sign out and sign in again\" to grant Google Calendar access.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool")]
    UnknownTool(String),

    #[error("{what} similar to \"{fragment}\" not found.")]
    NotFound { what: String, fragment: String },

    #[error("Key Result similar to \"{fragment}\" not found in objective \"{objective}\".")]
    KeyResultNotFound { objective: String, fragment: String },

    #[error("{CALENDAR_PERMISSION_TEXT}")]
    PermissionMissing,

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Calendar(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn not_found(what: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            fragment: fragment.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::InvalidArguments(format!("missing required field '{field}'"))
    }
}

impl From<CalendarError> for ToolError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::PermissionMissing => Self::PermissionMissing,
            other => Self::Calendar(other.to_string()),
        }
    }
}
