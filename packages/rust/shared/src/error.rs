//! Error types for Templatesmith.
//!
//! Library crates use [`TemplatesmithError`] via `thiserror`.
//! App crates (cli/server) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Templatesmith operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplatesmithError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching templates.
    #[error("network error: {0}")]
    Network(String),

    /// Rule book, field catalog, or wire payload could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The text-generation collaborator failed or returned an unusable reply.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Caller input rejected before any outbound call.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TemplatesmithError>;

impl TemplatesmithError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TemplatesmithError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = TemplatesmithError::validation("Prompt is required");
        assert!(err.to_string().contains("Prompt is required"));

        let err = TemplatesmithError::Upstream("HTTP 429".into());
        assert_eq!(err.to_string(), "upstream error: HTTP 429");
    }

    #[test]
    fn only_validation_is_client_fault() {
        assert!(TemplatesmithError::validation("x").is_validation());
        assert!(!TemplatesmithError::Upstream("x".into()).is_validation());
        assert!(!TemplatesmithError::Network("x".into()).is_validation());
    }
}
