//! Error types for search operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A malformed size or time comparison expression.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Invalid comparison `{expression}`: {reason}")]
pub struct ExpressionError {
    /// The expression as supplied by the caller.
    pub expression: String,
    /// What was wrong with it.
    pub reason: String,
}

impl ExpressionError {
    /// Create a new expression error.
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that abort a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Size or time comparison could not be parsed.
    #[error(transparent)]
    InvalidExpression(#[from] ExpressionError),

    /// Glob or discard pattern could not be compiled.
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An async traversal task panicked or was cancelled.
    #[error("Search task failed: {message}")]
    TaskFailed { message: String },
}

impl SearchError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied { path } | Self::NotFound { path } | Self::Io { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Errors recorded by fluent configuration calls and reported when a
/// search starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Malformed comparison expression.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// Malformed glob or regex.
    #[error("Invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

impl From<ConfigError> for SearchError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Expression(e) => SearchError::InvalidExpression(e),
            ConfigError::Pattern { pattern, message } => {
                SearchError::InvalidPattern { pattern, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_io() {
        let err = SearchError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, SearchError::PermissionDenied { .. }));
        assert_eq!(err.path(), Some(std::path::Path::new("/test/path")));
    }

    #[test]
    fn test_search_error_io_other() {
        let err = SearchError::io("/x", std::io::Error::other("boom"));
        assert!(matches!(err, SearchError::Io { .. }));
        assert!(err.to_string().contains("/x"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SearchError =
            ConfigError::Expression(ExpressionError::new("<<1", "bad operator")).into();
        assert!(matches!(err, SearchError::InvalidExpression(_)));
        assert!(err.to_string().contains("<<1"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Pattern {
            pattern: "a[b".into(),
            message: "unclosed class".into(),
        };
        assert_eq!(err.to_string(), "Invalid pattern `a[b`: unclosed class");

        let err: ConfigError = ExpressionError::new(">>", "missing number").into();
        assert_eq!(err.to_string(), "Invalid comparison `>>`: missing number");
        assert_eq!(
            err.to_string(),
            SearchError::from(err.clone()).to_string()
        );
    }
}
