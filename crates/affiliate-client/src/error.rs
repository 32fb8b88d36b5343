//! Check error types.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the registration and affiliation checks.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Neither a client id nor an email was supplied.
    #[error("Either client_id or email must be provided")]
    NoIdentifierProvided,

    /// Every authentication strategy was exhausted.
    #[error("Failed to authenticate with the affiliate API")]
    AuthFailed,

    /// Upstream failure after all fallbacks and the single retry.
    #[error("{message}")]
    ApiFailed {
        /// HTTP status code, absent for transport failures.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type for check operations.
pub type CheckResult<T> = Result<T, CheckError>;

impl CheckError {
    /// API failure for a non-success status.
    pub fn status(status: u16) -> Self {
        CheckError::ApiFailed {
            status: Some(status),
            message: format!("API request failed with status code: {}", status),
        }
    }

    /// Get error code for caller-facing reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            CheckError::NoIdentifierProvided => "NO_IDENTIFIER_PROVIDED",
            CheckError::AuthFailed => "AUTH_FAILED",
            CheckError::ApiFailed { .. } => "API_FAILED",
            CheckError::Config(_) => "CONFIG_ERROR",
            CheckError::Client(_) => "CLIENT_ERROR",
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CheckError::ApiFailed { status, .. } => *status,
            _ => None,
        }
    }
}
