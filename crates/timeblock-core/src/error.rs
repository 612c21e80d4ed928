//! Core error types for timeblock-core.
//!
//! Every store failure names the operation it came from, and the two
//! partial-failure cases (event created but completion failed, copy inserted
//! but original not deleted) are distinct variants carrying the record that
//! was created before the failure.

use std::path::PathBuf;
use thiserror::Error;

use crate::stores::{EventRecord, RawTask};

/// Core error type for timeblock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential-related errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Task Store / Event Store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Scheduling errors, including partial failure
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Task-move errors, including partial failure
    #[error("Move error: {0}")]
    Move(#[from] MoveError),

    /// The given id matches no task (or more than one) in the working set
    #[error("No task with id '{0}' in the loaded task set")]
    UnknownTask(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Credential Provider errors. Never retried by the core; the caller may
/// prompt for re-authentication.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Authorization failed
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Callback timeout
    #[error("OAuth callback timeout: no callback received within {timeout_secs} seconds")]
    CallbackTimeout { timeout_secs: u64 },

    /// Invalid callback
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// Not authenticated
    #[error("Not authenticated with Google; run `timeblock auth login` first")]
    NotAuthenticated,

    /// Client credentials not configured
    #[error("OAuth client credentials not configured; run `timeblock auth login` with --client-id and --client-secret")]
    ClientNotConfigured,

    /// OS keyring failure
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Task Store / Event Store errors. Each variant names the operation that
/// failed so a caller can report a single failed remote call precisely.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The HTTP request itself failed (network, TLS, timeout)
    #[error("'{operation}' request failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The remote API answered with a non-success status
    #[error("'{operation}' failed: HTTP {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded
    #[error("'{operation}' returned an unreadable response: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },

    /// No usable credential for the call
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Scheduling Orchestrator errors.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Event creation failed; nothing happened remotely.
    #[error("Could not create the calendar event: {0}")]
    Event(#[source] StoreError),

    /// The event was created but marking the task completed failed.
    /// The calendar event exists and is not rolled back.
    #[error("Event '{}' was created, but marking the task completed failed: {source}", .event.id)]
    CompletionAfterEvent {
        event: EventRecord,
        #[source]
        source: StoreError,
    },
}

/// Task-move errors.
#[derive(Error, Debug)]
pub enum MoveError {
    /// Inserting the copy failed; the source task is untouched.
    #[error("Could not insert the task into the destination list: {0}")]
    Insert(#[source] StoreError),

    /// The copy was inserted but deleting the original failed. Both tasks
    /// now exist; nothing is rolled back.
    #[error("Task copy '{}' was created, but deleting the original failed: {source}", .copy.id)]
    DeleteAfterInsert {
        copy: RawTask,
        #[source]
        source: StoreError,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
