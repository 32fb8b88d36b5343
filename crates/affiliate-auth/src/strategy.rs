//! Login strategy descriptors.
//!
//! The authenticator walks an ordered list of these descriptors. Each one
//! says where to send credentials and how to shape the body; none of them
//! carries behavior of its own.

use crate::endpoint::ApiVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the identity field in a login body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    /// `{"login": ..., "password": ...}`
    Login,
    /// `{"email": ..., "password": ...}`
    Email,
}

impl CredentialField {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialField::Login => "login",
            CredentialField::Email => "email",
        }
    }
}

/// One way of obtaining a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoginStrategy {
    /// Visit the login page with a cookie jar, then post credentials.
    ///
    /// The resulting session cookies are cached with the token.
    WebSession {
        /// Page fetched first to collect session cookies
        login_page: String,
        /// Versioned path credentials are posted to
        version: ApiVersion,
        /// Path under the version prefix
        path: String,
    },

    /// Single POST of credentials, no cookies.
    Direct {
        /// API version prefix
        version: ApiVersion,
        /// Path under the version prefix
        path: String,
        /// Identity field name
        field: CredentialField,
    },
}

impl LoginStrategy {
    /// Create a direct strategy.
    pub fn direct(version: ApiVersion, path: impl Into<String>, field: CredentialField) -> Self {
        LoginStrategy::Direct {
            version,
            path: path.into(),
            field,
        }
    }

    /// The chain used when nothing else is configured.
    ///
    /// Web session first, then four direct variants.
    pub fn default_chain() -> Vec<LoginStrategy> {
        vec![
            LoginStrategy::WebSession {
                login_page: "/en/auth/login/".to_string(),
                version: ApiVersion::V1,
                path: "/auth/login/".to_string(),
            },
            LoginStrategy::direct(ApiVersion::V2, "/auth/", CredentialField::Login),
            LoginStrategy::direct(ApiVersion::V1, "/auth/", CredentialField::Email),
            LoginStrategy::direct(ApiVersion::V2, "/auth/", CredentialField::Email),
            LoginStrategy::direct(ApiVersion::V2, "/login/", CredentialField::Email),
        ]
    }

    /// Identity field used in the login body.
    pub fn field(&self) -> CredentialField {
        match self {
            LoginStrategy::WebSession { .. } => CredentialField::Email,
            LoginStrategy::Direct { field, .. } => *field,
        }
    }

    /// API version credentials are posted to.
    pub fn version(&self) -> ApiVersion {
        match self {
            LoginStrategy::WebSession { version, .. } | LoginStrategy::Direct { version, .. } => {
                *version
            }
        }
    }

    /// Path under the version prefix.
    pub fn path(&self) -> &str {
        match self {
            LoginStrategy::WebSession { path, .. } | LoginStrategy::Direct { path, .. } => path,
        }
    }

    /// Whether this strategy keeps session cookies.
    pub fn uses_cookies(&self) -> bool {
        matches!(self, LoginStrategy::WebSession { .. })
    }
}

impl fmt::Display for LoginStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStrategy::WebSession { version, path, .. } => {
                write!(f, "web_session {} {}", version.as_str(), path)
            }
            LoginStrategy::Direct {
                version,
                path,
                field,
            } => write!(f, "direct {} {} ({})", version.as_str(), path, field.as_str()),
        }
    }
}
