//! Validation error types.

use affiliate_client::CheckError;
use thiserror::Error;

/// Result store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Records must be keyed by a non-blank client key.
    #[error("Client key must not be empty")]
    EmptyKey,

    /// Storage backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by [`Validator::validate`](crate::Validator::validate).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Neither a client id nor an email was supplied.
    #[error("Either client_id or email must be provided")]
    NoIdentifierProvided,

    /// Every authentication strategy was exhausted.
    #[error("Failed to authenticate with the affiliate API")]
    AuthFailed,

    /// Upstream failure after all fallbacks.
    #[error("{message}")]
    ApiFailed {
        /// HTTP status code, absent for transport failures.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// Client setup failure.
    #[error("Client error: {0}")]
    Client(String),

    /// The outcome could not be stored.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<CheckError> for ValidationError {
    fn from(err: CheckError) -> Self {
        match err {
            CheckError::NoIdentifierProvided => ValidationError::NoIdentifierProvided,
            CheckError::AuthFailed => ValidationError::AuthFailed,
            CheckError::ApiFailed { status, message } => {
                ValidationError::ApiFailed { status, message }
            }
            other => ValidationError::Client(other.to_string()),
        }
    }
}

impl ValidationError {
    /// Get error code for caller-facing reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::NoIdentifierProvided => "NO_IDENTIFIER_PROVIDED",
            ValidationError::AuthFailed => "AUTH_FAILED",
            ValidationError::ApiFailed { .. } => "API_FAILED",
            ValidationError::Client(_) => "CLIENT_ERROR",
            ValidationError::Store(_) => "STORE_ERROR",
        }
    }

    /// Message safe to show to the person who asked for the validation.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::Client(_) | ValidationError::Store(_) => {
                "The validation could not be completed. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}
