//! Result and error types for the harness.
//!
//! Everything in here is a fatal error: it aborts the run before a result
//! document is written. Per-export failures are not errors at this level;
//! they are captured as [`crate::Failure`] text inside the result record.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for harness operations
pub type ConformResult<T> = Result<T, ConformError>;

/// Errors that abort a harness run
#[derive(Debug, Error)]
pub enum ConformError {
    /// Reading an input artifact failed
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing an output artifact failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Path that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Text-format source was not valid UTF-8
    #[error("{} is not valid UTF-8", path.display())]
    InvalidUtf8 {
        /// Path of the text source
        path: PathBuf,
    },

    /// The text-to-binary compiler rejected the source
    #[error("Text compilation failed: {message}")]
    TextCompile {
        /// Compiler diagnostic, verbatim
        message: String,
    },

    /// The compiled binary uses a feature outside the enabled feature set
    #[error("Validation against the enabled feature set failed: {message}")]
    FeatureValidation {
        /// Validator diagnostic, verbatim
        message: String,
    },

    /// Test data was not an object of argument arrays
    #[error("Invalid test data: {message}")]
    TestData {
        /// Error message
        message: String,
    },

    /// The engine could not be configured
    #[error("Engine configuration failed: {message}")]
    Engine {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConformError {
    /// Create a read error for a path
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a write error for a path
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a text compilation error
    #[must_use]
    pub fn text_compile(message: impl Into<String>) -> Self {
        Self::TextCompile {
            message: message.into(),
        }
    }

    /// Create a feature validation error
    #[must_use]
    pub fn feature_validation(message: impl Into<String>) -> Self {
        Self::FeatureValidation {
            message: message.into(),
        }
    }

    /// Create a test data error
    #[must_use]
    pub fn test_data(message: impl Into<String>) -> Self {
        Self::TestData {
            message: message.into(),
        }
    }

    /// Create an engine configuration error
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ConformError::read("cases/add.wasm", io);
        let text = err.to_string();
        assert!(text.contains("cases/add.wasm"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn test_text_compile_keeps_diagnostic() {
        let err = ConformError::text_compile("expected `(`\n --> add.wat:1:1");
        assert!(err.to_string().contains("add.wat:1:1"));
    }

    #[test]
    fn test_test_data_error() {
        let err = ConformError::test_data("top-level value must be an object");
        assert!(err.to_string().starts_with("Invalid test data"));
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConformError = io.into();
        assert!(err.to_string().contains("I/O"));
    }
}
