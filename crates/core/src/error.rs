//! Error types for the sira domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Every pipeline stage returns one of these; nothing in the core retries.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all sira operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Filesystem errors ---
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Template errors ---
    #[error("Could not find parameter \"{name}\" in template")]
    Parameter { name: String },

    #[error("Unsupported value for parameter \"{name}\": expected string or integer, found {kind}")]
    Type { name: String, kind: &'static str },

    // --- Completion service errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] ProviderError),

    // --- Conversation file integrity ---
    #[error("Integrity error on {path}: {reason}")]
    Integrity { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by a completion service implementation.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_error_names_the_key() {
        let err = Error::Parameter {
            name: "color".into(),
        };
        assert!(err.to_string().contains("\"color\""));
    }

    #[test]
    fn type_error_names_the_kind() {
        let err = Error::Type {
            name: "ratio".into(),
            kind: "float",
        };
        let text = err.to_string();
        assert!(text.contains("ratio"));
        assert!(text.contains("float"));
    }

    #[test]
    fn provider_error_converts_to_transport() {
        let err: Error = ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        }
        .into();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("500"));
    }
}
