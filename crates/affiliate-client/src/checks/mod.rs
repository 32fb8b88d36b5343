//! Registration and affiliation checks.
//!
//! - Registration: `GET {version}/reports/clients/` filtered by client
//!   account or email, tried on each API version in turn.
//! - Affiliation: `POST` of `{email}` to the affiliation endpoint.
//!
//! Both retry exactly once after a 401, with a freshly obtained token.

pub mod affiliation;
pub mod registration;

pub use affiliation::{AffiliationCheck, AffiliationFailure, CheckStatus};
pub use registration::RegistrationCheck;

use serde::{Deserialize, Serialize};

/// Identifier a registration check filters on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClientLookup {
    /// Client account id.
    ClientId(String),
    /// Client email.
    Email(String),
}

impl ClientLookup {
    /// Pick the identifier to use; a client id wins over an email.
    ///
    /// Blank values count as absent. Returns `None` when neither is usable.
    pub fn from_parts(client_id: Option<&str>, email: Option<&str>) -> Option<Self> {
        let present = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        present(client_id)
            .map(ClientLookup::ClientId)
            .or_else(|| present(email).map(ClientLookup::Email))
    }

    /// Query parameter name and value for the clients report.
    pub fn query(&self) -> (&'static str, &str) {
        match self {
            ClientLookup::ClientId(id) => ("client_account", id.as_str()),
            ClientLookup::Email(email) => ("email", email.as_str()),
        }
    }

    /// The identifier itself.
    pub fn value(&self) -> &str {
        match self {
            ClientLookup::ClientId(value) | ClientLookup::Email(value) => value.as_str(),
        }
    }
}
