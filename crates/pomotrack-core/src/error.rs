//! Core error types for pomotrack-core.
//!
//! None of these errors is fatal to the countdown: storage and notification
//! failures are logged by the engine and swallowed, validation failures are
//! returned to the caller with the previous values left in place.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomotrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistent store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Notification backend errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Rejected input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`Store`](crate::storage::Store) implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A read or write against the backend failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The store has been closed or its worker is gone
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded
    #[error("Malformed value for '{key}': {message}")]
    Malformed { key: String, message: String },
}

/// Errors raised by a [`Notifier`](crate::notify::Notifier).
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The user refused notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The platform backend failed to deliver or schedule
    #[error("Notification backend failed: {0}")]
    Backend(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine a data directory
    #[error("No usable data directory: {0}")]
    NoDataDir(String),
}

/// Rejected input (the "InvalidInput" class).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Zero or negative duration
    #[error("'{field}' must be greater than zero")]
    NonPositive { field: &'static str },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// The operation is only allowed while the timer is paused
    #[error("'{operation}' is not allowed while the timer is running")]
    TimerRunning { operation: &'static str },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
