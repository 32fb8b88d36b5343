//! Client affiliation check.
//!
//! Upstream failures here do not become `Err`: they are reported as an
//! [`AffiliationCheck`] with [`CheckStatus::Error`] so the caller can still
//! record and render a result. Only a missing email and authentication
//! failure are returned as errors.

use crate::client::{AffiliateClient, RawResponse};
use crate::error::{CheckError, CheckResult};
use crate::response::AffiliationBody;
use affiliate_auth::{excerpt, AuthToken};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

const NOT_FOUND_MESSAGE: &str = "Client not found or not affiliated";

/// Whether the check produced a definitive answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Error,
}

/// Why an affiliation check degraded to "not affiliated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliationFailure {
    /// Non-success status or transport failure.
    ApiFailed,
    /// A 200 whose body was not a JSON object.
    ParseFailed,
}

impl AffiliationFailure {
    /// Get error code for caller-facing reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            AffiliationFailure::ApiFailed => "API_FAILED",
            AffiliationFailure::ParseFailed => "PARSE_FAILED",
        }
    }
}

/// Outcome of an affiliation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliationCheck {
    pub status: CheckStatus,

    /// Normalized affiliation flag; always false for degraded outcomes.
    pub is_affiliated: bool,

    /// Link code, empty when absent.
    #[serde(default)]
    pub link_code: String,

    /// Accounts reported by the upstream.
    #[serde(default)]
    pub accounts: Vec<Value>,

    /// Upstream status code of a failed request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<AffiliationFailure>,
}

impl AffiliationCheck {
    fn found(body: AffiliationBody) -> Self {
        Self {
            status: CheckStatus::Success,
            is_affiliated: body.signal.is_affiliated(),
            link_code: body.link_code,
            accounts: body.accounts,
            code: None,
            message: None,
            failure: None,
        }
    }

    fn not_found(message: &str) -> Self {
        Self {
            status: CheckStatus::Success,
            is_affiliated: false,
            link_code: String::new(),
            accounts: Vec::new(),
            code: None,
            message: Some(message.to_string()),
            failure: None,
        }
    }

    fn failed(failure: AffiliationFailure, code: Option<u16>, message: String) -> Self {
        Self {
            status: CheckStatus::Error,
            is_affiliated: false,
            link_code: String::new(),
            accounts: Vec::new(),
            code,
            message: Some(message),
            failure: Some(failure),
        }
    }

    fn status_failed(status: StatusCode) -> Self {
        Self::failed(
            AffiliationFailure::ApiFailed,
            Some(status.as_u16()),
            format!("API request failed with status code: {}", status.as_u16()),
        )
    }

    /// Whether the upstream gave a definitive answer.
    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }
}

impl AffiliateClient {
    /// Check whether the client with `email` is affiliated.
    ///
    /// A 404 is a definitive "not affiliated". A 401 triggers one
    /// re-authentication and one retry.
    #[instrument(skip(self))]
    pub async fn check_affiliation(&self, email: &str) -> CheckResult<AffiliationCheck> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CheckError::NoIdentifierProvided);
        }

        let token = self.authenticator().authenticate().await.map_err(|e| {
            warn!(error = %e, "Authentication failed before affiliation check");
            CheckError::AuthFailed
        })?;

        let url = self.affiliation_url();
        info!(url = %url, "Checking client affiliation");

        let response = match self.post_affiliation(&url, email, &token).await {
            Ok(response) => response,
            Err(check) => return Ok(check),
        };

        let check = match response.status {
            StatusCode::OK => Self::parse_affiliation(&response.body),
            StatusCode::NOT_FOUND => AffiliationCheck::not_found(NOT_FOUND_MESSAGE),
            StatusCode::UNAUTHORIZED => {
                return self.retry_affiliation(&url, email, &token).await;
            }
            status => {
                error!(
                    status = status.as_u16(),
                    body = %excerpt(&response.body),
                    "Affiliation request failed"
                );
                AffiliationCheck::status_failed(status)
            }
        };

        Ok(check)
    }

    async fn retry_affiliation(
        &self,
        url: &str,
        email: &str,
        rejected: &AuthToken,
    ) -> CheckResult<AffiliationCheck> {
        info!("Token rejected, re-authenticating once");
        let fresh = self.authenticator().reauthenticate(rejected).await.map_err(|e| {
            warn!(error = %e, "Re-authentication failed");
            CheckError::AuthFailed
        })?;

        let response = match self.post_affiliation(url, email, &fresh).await {
            Ok(response) => response,
            Err(check) => return Ok(check),
        };

        let check = match response.status {
            StatusCode::OK => Self::parse_affiliation(&response.body),
            StatusCode::NOT_FOUND => {
                AffiliationCheck::not_found(&format!("{} (after token refresh)", NOT_FOUND_MESSAGE))
            }
            status => {
                if status == StatusCode::UNAUTHORIZED {
                    self.authenticator().invalidate(&fresh).await;
                }
                error!(
                    status = status.as_u16(),
                    body = %excerpt(&response.body),
                    "Affiliation retry failed"
                );
                AffiliationCheck::status_failed(status)
            }
        };

        Ok(check)
    }

    /// Transport failures come back as a degraded outcome.
    async fn post_affiliation(
        &self,
        url: &str,
        email: &str,
        token: &AuthToken,
    ) -> Result<RawResponse, AffiliationCheck> {
        let request = self
            .http()
            .post(url)
            .headers(self.authorized_headers(token, self.affiliation_path()))
            .json(&json!({ "email": email }));

        self.send(request).await.map_err(|e| {
            error!(error = %e, "Error checking client affiliation");
            AffiliationCheck::failed(
                AffiliationFailure::ApiFailed,
                None,
                format!("Error checking client affiliation: {}", e),
            )
        })
    }

    fn parse_affiliation(body: &str) -> AffiliationCheck {
        match AffiliationBody::parse(body) {
            Ok(parsed) => {
                debug!(signal = ?parsed.signal, "Affiliation body parsed");
                AffiliationCheck::found(parsed)
            }
            Err(message) => {
                error!(body = %excerpt(body), "Unparsable affiliation body");
                AffiliationCheck::failed(AffiliationFailure::ParseFailed, None, message)
            }
        }
    }
}
