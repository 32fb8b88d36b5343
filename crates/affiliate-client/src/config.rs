//! Client configuration.
//!
//! Provides configuration for the affiliate API host, the account
//! credentials, and timeout settings. Configuration is loaded from
//! environment variables with defaults for everything except the secrets.

use affiliate_auth::{ApiEndpoint, Credentials, HttpSettings};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Default upstream host.
pub const DEFAULT_API_URL: &str = "https://my.exnessaffiliates.com";

/// Default affiliation endpoint path.
pub const DEFAULT_AFFILIATION_PATH: &str = "/api/partner/affiliation/";

/// Affiliate API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upstream host.
    pub api: ApiEndpoint,

    /// API account credentials, absent until configured.
    pub credentials: Option<Credentials>,

    /// Path of the affiliation endpoint.
    pub affiliation_path: String,

    /// Per-request timeout in seconds.
    pub default_timeout_secs: u64,

    /// Delay between direct login attempts in milliseconds.
    pub login_spacing_ms: u64,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    /// Returns default configuration without credentials.
    fn default() -> Self {
        Self {
            api: ApiEndpoint::new(DEFAULT_API_URL),
            credentials: None,
            affiliation_path: DEFAULT_AFFILIATION_PATH.to_string(),
            default_timeout_secs: 30,
            login_spacing_ms: 1000,
            verify_tls: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AFFILIATE_API_URL`: Upstream host (default: https://my.exnessaffiliates.com)
    /// - `AFFILIATE_API_EMAIL`: API account email
    /// - `AFFILIATE_API_PASSWORD`: API account password
    /// - `AFFILIATE_AFFILIATION_PATH`: Affiliation path (default: /api/partner/affiliation/)
    /// - `AFFILIATE_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `AFFILIATE_LOGIN_SPACING_MS`: Delay between direct login attempts (default: 1000)
    /// - `AFFILIATE_VERIFY_TLS`: Whether to verify TLS (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        let credentials = match (
            std::env::var("AFFILIATE_API_EMAIL").ok(),
            std::env::var("AFFILIATE_API_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(Credentials::new(email, password)),
            _ => None,
        };

        Self {
            api: ApiEndpoint::new(
                std::env::var("AFFILIATE_API_URL").unwrap_or(default.api.base_url),
            ),
            credentials,
            affiliation_path: std::env::var("AFFILIATE_AFFILIATION_PATH")
                .unwrap_or(default.affiliation_path),
            default_timeout_secs: std::env::var("AFFILIATE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_timeout_secs),
            login_spacing_ms: std::env::var("AFFILIATE_LOGIN_SPACING_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.login_spacing_ms),
            verify_tls: std::env::var("AFFILIATE_VERIFY_TLS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.verify_tls),
        }
    }

    /// Set the account credentials.
    pub fn with_credentials(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(email, password));
        self
    }

    /// Get the default request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Get the login attempt spacing as a Duration.
    pub fn login_spacing(&self) -> Duration {
        Duration::from_millis(self.login_spacing_ms)
    }

    /// Transport settings for outbound calls.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: self.timeout(),
            verify_tls: self.verify_tls,
        }
    }

    /// Credentials, or the variable that should have supplied them.
    pub fn require_credentials(&self) -> Result<&Credentials, ConfigError> {
        self.credentials.as_ref().ok_or_else(|| {
            ConfigError::MissingEnvVar("AFFILIATE_API_EMAIL/AFFILIATE_API_PASSWORD".to_string())
        })
    }

    /// Validate that all required configuration is present for production.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        let credentials = self.require_credentials()?;
        if credentials.email.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "AFFILIATE_API_EMAIL".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if credentials.password().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "AFFILIATE_API_PASSWORD".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AFFILIATE_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
