//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),

    #[error("Server URL must use TLS in production")]
    ServerUrlMustBeSecure,

    #[error("Invalid handshake timeout")]
    InvalidTimeout,

    #[error("Reconnect max_attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Reconnect delay must be between 1ms and 60000ms")]
    InvalidReconnectDelay,

    #[error("Queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("Queue max age must be at least 1 second")]
    InvalidQueueMaxAge,

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}
