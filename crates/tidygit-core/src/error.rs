//! Error types for tidygit operations

use thiserror::Error;

/// Core error type for tidygit operations
#[derive(Error, Debug)]
pub enum TidyError {
    /// A git subcommand exited non-zero or produced unusable output
    #[error("{operation}: {message}")]
    Git { operation: String, message: String },

    /// The git binary could not be executed at all
    #[error("git is not installed or not found on PATH")]
    GitNotInstalled,

    /// `gh pr list` answered, but not with the JSON we asked for
    #[error("parsing PR data: {0}")]
    PrParse(String),

    /// Target path is missing or not a directory
    #[error("{0}")]
    NotADirectory(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl TidyError {
    /// Build a git failure from an operation label and raw command output
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        TidyError::Git {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
