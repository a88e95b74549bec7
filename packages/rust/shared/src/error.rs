//! Error types for prgen.
//!
//! Library crates use [`PrgenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all prgen operations.
#[derive(Debug, thiserror::Error)]
pub enum PrgenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure while talking to a model provider.
    #[error("network error: {0}")]
    Network(String),

    /// The model provider answered with a non-success status.
    #[error("generation failed: HTTP {status}{hint}\nresponse: {body}")]
    Generation {
        status: u16,
        hint: String,
        body: String,
    },

    /// A git invocation failed or git is unavailable.
    #[error("git error: {0}")]
    Git(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad flag value, unknown provider, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrgenError>;

impl PrgenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a git error from any displayable message.
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PrgenError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = PrgenError::git("not a repository");
        assert_eq!(err.to_string(), "git error: not a repository");
    }

    #[test]
    fn generation_error_includes_hint_and_body() {
        let err = PrgenError::Generation {
            status: 429,
            hint: " (rate limit reached)".into(),
            body: "{\"error\":\"slow down\"}".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 429 (rate limit reached)"));
        assert!(msg.contains("slow down"));
    }
}
