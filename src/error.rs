//! Error handling and custom error types
//!
//! Provides unified error handling across the uploader using thiserror.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please provide a file path as an argument.")]
    Usage,

    #[error("Failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// True when the failure was detected before any I/O happened.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_service_message() {
        let err = Error::Api {
            status: 401,
            message: "Session not found".to_string(),
        };
        assert_eq!(err.to_string(), "Session not found (status 401)");
    }

    #[test]
    fn test_file_error_names_path() {
        let err = Error::file(
            "/tmp/missing.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/missing.png"));
        assert!(message.contains("No such file or directory"));
        assert!(!err.is_usage());
    }

    #[test]
    fn test_usage_error() {
        assert!(Error::Usage.is_usage());
        assert_eq!(
            Error::Usage.to_string(),
            "Please provide a file path as an argument."
        );
    }
}
