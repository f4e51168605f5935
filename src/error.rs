//! Error types for chatgate
//!
//! This module defines the error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for chatgate operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, provider setup, and session management.
///
/// Failures of the remote completion call itself are deliberately not
/// represented here: they are classified into a closed set of kinds by
/// [`crate::providers::CompletionError`] and recovered locally with a
/// canned reply, so they never surface to callers as errors.
#[derive(Error, Debug)]
pub enum ChatgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (client construction, credentials, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for chatgate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
