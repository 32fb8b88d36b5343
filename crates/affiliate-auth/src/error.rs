//! Error types for upstream authentication
//!
//! This module defines the errors that can occur while obtaining a bearer
//! token from the affiliate API.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Every login strategy, including the browser fallback, was exhausted
    #[error("Failed to authenticate with the affiliate API")]
    AuthFailed,

    /// A login attempt answered without a usable token
    #[error("Login rejected ({status}): {message}")]
    LoginRejected {
        /// HTTP status code
        status: u16,
        /// Reason or body excerpt
        message: String,
    },

    /// HTTP transport failure (connection, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Longest body excerpt carried in an error.
pub const EXCERPT_LEN: usize = 200;

/// Truncate a response body for inclusion in errors and logs.
pub fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= EXCERPT_LEN {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(EXCERPT_LEN).collect();
    short.push_str("...");
    short
}

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Transport errors on a single attempt are expected while walking the
    /// fallback chain and are logged as warnings instead.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::AuthFailed | AuthError::Config(_))
    }

    /// Get error code for caller-facing reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::AuthFailed => "AUTH_FAILED",
            AuthError::LoginRejected { .. } => "LOGIN_REJECTED",
            AuthError::Transport(_) => "TRANSPORT_ERROR",
            AuthError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Transport(err.to_string())
    }
}
