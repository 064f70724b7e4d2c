//! Error types for filepolicy.
//!
//! Policy resolution itself never fails: every resolver has a defined
//! fallback for malformed or missing settings. Errors only surface where a
//! collaborator performs a fallible operation (persisting a setting, reading
//! file metadata) or where caller input has to be parsed.

use thiserror::Error;

/// Validation errors for caller-supplied input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid resource '{input}': {reason}")]
    InvalidResource {
        input: String,
        reason: String,
    },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern {
        pattern: String,
        reason: String,
    },
}

/// Errors raised by a configuration backend.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Setting '{key}' is not writable")]
    NotWritable {
        key: String,
    },

    #[error("Configuration backend error: {message}")]
    Backend {
        message: String,
    },
}

/// Errors raised while resolving file metadata.
#[derive(Debug, Error)]
pub enum FileServiceError {
    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
    },

    #[error("No file system provider registered for scheme '{scheme}'")]
    NoProvider {
        scheme: String,
    },

    #[error("I/O error on {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while receiving from an event stream. Returned directly by
/// [`crate::EventStream`]; never part of a policy operation.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Event stream disconnected")]
    Disconnected,

    #[error("No event received within {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Top-level error type for filepolicy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("File service error: {0}")]
    FileService(#[from] FileServiceError),
}

impl PolicyError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this is a file service error.
    #[must_use]
    pub const fn is_file_service(&self) -> bool {
        matches!(self, Self::FileService(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Configuration(e) => matches!(e, ConfigurationError::Backend { .. }),
            Self::FileService(e) => matches!(e, FileServiceError::Io { .. }),
        }
    }
}

/// Result type alias for filepolicy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
