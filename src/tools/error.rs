//! Tool error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during tool execution
///
/// These never cross the tool boundary as Rust errors: the registry folds
/// them into a failed [`ToolResult`](super::ToolResult) so the conversation
/// can continue.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{action} was disallowed by the user.")]
    NotConfirmed { action: String },

    #[error("No matches found")]
    NoMatches,

    #[error("Process killed after timeout of {}s", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("Invalid arguments: {}", .violations.join("; "))]
    InvalidArguments { violations: Vec<String> },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Shorthand for a single-violation argument error
    pub fn invalid(violation: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            violations: vec![violation.into()],
        }
    }

    /// Map an IO error on `path`, keeping `NotFound` distinct from the rest
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound { path: path.into() }
        } else {
            ToolError::Io(err)
        }
    }

    /// Stable machine-readable category, embedded in failed results
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound { .. } => "not_found",
            ToolError::NotConfirmed { .. } => "not_confirmed",
            ToolError::NoMatches => "no_matches",
            ToolError::Timeout { .. } => "timeout",
            ToolError::InvalidArguments { .. } | ToolError::InvalidPattern { .. } => "invalid_arguments",
            ToolError::UnknownTool { .. } => "unknown_tool",
            ToolError::Spawn { .. } | ToolError::Io(_) => "io",
        }
    }
}
