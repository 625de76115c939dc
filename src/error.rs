use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the llm-relay library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Chunk size must be a positive word count.
    #[error("Invalid chunk size: {size}. Chunk size must be at least 1 word.")]
    InvalidChunkSize {
        /// The rejected chunk size
        size: usize,
    },

    /// Language code has no model mapped to it.
    #[error("Unknown language '{language}'. Known languages: {known}")]
    UnknownLanguage {
        /// The unrecognized language code
        language: String,
        /// Comma-separated list of configured language codes
        known: String,
    },

    /// Transport-level failure reaching the completion endpoint.
    #[error("Network error: {message}")]
    Network {
        /// Error message
        message: String,
    },

    /// Completion endpoint returned a non-success status.
    #[error("Completion endpoint returned {status}: {message}")]
    Endpoint {
        /// HTTP status code
        status: u16,
        /// Response body or status description
        message: String,
    },

    /// Completion endpoint returned a body we could not use.
    #[error("Invalid endpoint response: {message}")]
    InvalidResponse {
        /// Error message
        message: String,
    },

    /// Remote failure for one chunk, paired with its position in the batch.
    #[error("Completion failed for chunk {index}: {message}")]
    Completion {
        /// Zero-based chunk index within the batch
        index: usize,
        /// Underlying failure message
        message: String,
    },

    /// Interactive line editor failure.
    #[error("Interactive session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Multiple errors occurred during processing.
    #[error("Multiple errors occurred during processing ({count} errors)")]
    Multiple {
        /// Number of errors
        count: usize,
        /// Collection of errors
        errors: Vec<Error>,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Pairs a chunk-level failure with its batch position.
    #[must_use]
    pub fn completion(index: usize, source: &Self) -> Self {
        Self::Completion {
            index,
            message: source.to_string(),
        }
    }

    /// Creates a session error.
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Combines multiple errors into a single error.
    #[must_use]
    pub fn multiple(errors: Vec<Self>) -> Self {
        let count = errors.len();
        Self::Multiple { count, errors }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this failure came from the remote endpoint.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Endpoint { .. } | Self::InvalidResponse { .. }
        )
    }
}

// reqwest errors are not Clone, so only the message is kept
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network {
            message: e.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_completion_error_keeps_index() {
        let inner = Error::Endpoint {
            status: 429,
            message: "too many requests".to_string(),
        };
        let err = Error::completion(3, &inner);
        assert!(err.to_string().contains("chunk 3"));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = vec![Error::config("error 1"), Error::config("error 2")];
        let combined = Error::multiple(errors);
        assert!(combined.to_string().contains("2 errors"));
    }

    #[test]
    fn test_is_remote() {
        assert!(Error::network("connection refused").is_remote());
        assert!(
            Error::Endpoint {
                status: 500,
                message: "server error".to_string(),
            }
            .is_remote()
        );
        assert!(!Error::config("bad settings").is_remote());
    }

    #[test]
    fn test_error_clone() {
        let err = Error::config("test");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_unknown_language_display() {
        let err = Error::UnknownLanguage {
            language: "xx".to_string(),
            known: "en, fr".to_string(),
        };
        assert!(err.to_string().contains("'xx'"));
        assert!(err.to_string().contains("en, fr"));
    }
}
