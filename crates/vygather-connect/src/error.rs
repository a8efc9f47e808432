//! Error types for vygather-connect

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur on the device connection.
///
/// All of these are channel-level conditions: a fact-gathering run that hits
/// one must abort rather than continue with a broken transport.
#[derive(Error, Debug, Clone)]
pub enum ConnectError {
    /// Failed to reach the device
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication with the device failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request timed out
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// Deadline that was exceeded
        timeout: Duration,
    },

    /// SSH key error
    #[error("SSH key error: {0}")]
    KeyError(String),

    /// I/O error on the session
    #[error("I/O error: {0}")]
    IoError(String),

    /// No session established
    #[error("not connected")]
    NotConnected,

    /// Invalid connection configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl ConnectError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConnectError::ConnectionFailed(_) | ConnectError::Timeout { .. }
        )
    }
}
