//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Harness library error
    #[error("{0}")]
    Conform(#[from] conform::ConformError),

    /// The module could not be instantiated, so no result was written
    #[error("Instantiation failed: {reason}")]
    Instantiation {
        /// Engine diagnostic
        reason: String,
    },

    /// Async runtime could not be started
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create an instantiation error
    #[must_use]
    pub fn instantiation(reason: impl Into<String>) -> Self {
        Self::Instantiation {
            reason: reason.into(),
        }
    }

    /// Create a runtime error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}
