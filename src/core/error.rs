//! Error type system for Quire
//!
//! This module provides the crate-wide error taxonomy with:
//! - A distinct variant per failure class so callers can present
//!   "format not supported" and "file unreadable" differently from
//!   "feature not available"
//! - Error context and chaining support
//! - Stable error type names for logging and API surfaces

use std::fmt;

/// Main error type for the Quire core
#[derive(Debug, thiserror::Error)]
pub enum QuireError {
    // Archive/document errors
    #[error("Unrecognized format: {0}")]
    Format(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Archive entry not found: {0}")]
    EntryNotFound(String),

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(String),

    #[error("Archive is encrypted: {0}")]
    Encrypted(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    // Plugin-related errors
    #[error("Plugin already registered: {0}")]
    DuplicateRegistration(String),

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Plugin initialization failed: {0}")]
    PluginInit(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("Reader already disposed: {0}")]
    AlreadyDisposed(String),

    // Ambient errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl QuireError {
    /// Get the error type name for logs and API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            QuireError::Format(_) => "Format",
            QuireError::Read(_) => "Read",
            QuireError::EntryNotFound(_) => "EntryNotFound",
            QuireError::UnsupportedCompression(_) => "UnsupportedCompression",
            QuireError::Encrypted(_) => "Encrypted",
            QuireError::Decode(_) => "Decode",
            QuireError::DuplicateRegistration(_) => "DuplicateRegistration",
            QuireError::PluginNotFound(_) => "PluginNotFound",
            QuireError::PluginInit(_) => "PluginInit",
            QuireError::UnsupportedOperation(_) => "UnsupportedOperation",
            QuireError::AlreadyDisposed(_) => "AlreadyDisposed",
            QuireError::Io(_) => "Io",
            QuireError::Network(_) => "Network",
            QuireError::Config(_) => "Config",
            QuireError::Storage(_) => "Storage",
            QuireError::Serialization(_) => "Serialization",
            QuireError::Validation(_) => "Validation",
        }
    }

    /// Whether this error means the feature is absent rather than the
    /// input being broken. Callers surface these two classes differently.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, QuireError::UnsupportedOperation(_))
    }

    /// Check if this error is retryable (transient I/O and network failures)
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuireError::Network(_) | QuireError::Io(_))
    }
}

/// Result type alias for operations that can fail with QuireError
pub type Result<T> = std::result::Result<T, QuireError>;

/// Context extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, producing a `Read` error
    fn read_context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure
    fn with_read_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn read_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let context_str = context.into();
            QuireError::Read(format!("{}: {}", context_str, e))
        })
    }

    fn with_read_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context_str = f();
            QuireError::Read(format!("{}: {}", context_str, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        assert_eq!(QuireError::Format("not a zip".into()).error_type(), "Format");
        assert_eq!(
            QuireError::EntryNotFound("001.jpg".into()).error_type(),
            "EntryNotFound"
        );
        assert_eq!(
            QuireError::DuplicateRegistration("app.quire.comic".into()).error_type(),
            "DuplicateRegistration"
        );
        assert_eq!(
            QuireError::AlreadyDisposed("session".into()).error_type(),
            "AlreadyDisposed"
        );
    }

    #[test]
    fn test_unsupported_is_distinct_from_hard_errors() {
        assert!(QuireError::UnsupportedOperation("search".into()).is_unsupported());
        assert!(!QuireError::Read("disk gone".into()).is_unsupported());
        assert!(!QuireError::Format("garbage".into()).is_unsupported());
    }

    #[test]
    fn test_error_retryable() {
        assert!(QuireError::Network("timeout".into()).is_retryable());
        assert!(!QuireError::Encrypted("secret.cbr".into()).is_retryable());
        assert!(!QuireError::UnsupportedOperation("oauth".into()).is_retryable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: QuireError = io.into();
        assert_eq!(err.error_type(), "Io");
    }

    #[test]
    fn test_read_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let contexted = result.read_context("Failed to read archive entry");

        assert!(contexted.is_err());
        let err = contexted.unwrap_err();
        assert!(err.to_string().contains("Failed to read archive entry"));
        assert!(err.to_string().contains("file not found"));
    }
}
