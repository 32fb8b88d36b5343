//! Client registration check against the clients report.

use super::ClientLookup;
use crate::client::AffiliateClient;
use crate::error::{CheckError, CheckResult};
use crate::response::{ClientRecord, ClientsReport};
use affiliate_auth::{excerpt, first_success, ApiVersion, AuthToken};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const CLIENTS_PATH: &str = "/reports/clients/";
const REPORTS_REFERER: &str = "/en/reports/";

/// Outcome of a registration check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationCheck {
    /// Whether the report listed the client.
    pub is_registered: bool,

    /// First listed client, present iff registered.
    pub client_data: Option<ClientRecord>,

    /// API version that answered.
    pub api_version: ApiVersion,
}

impl RegistrationCheck {
    fn from_report(report: ClientsReport, api_version: ApiVersion) -> Self {
        let client_data = report.into_first();
        Self {
            is_registered: client_data.is_some(),
            client_data,
            api_version,
        }
    }
}

impl AffiliateClient {
    /// Check whether a client is registered under the affiliate account.
    ///
    /// A client id takes priority over an email. Each API version is tried
    /// in order until one answers 200; an empty report is a successful "not
    /// registered". A 401 from the last version triggers one
    /// re-authentication and one retry whose result is final.
    #[instrument(skip(self))]
    pub async fn check_registration(
        &self,
        client_id: Option<&str>,
        email: Option<&str>,
    ) -> CheckResult<RegistrationCheck> {
        let lookup =
            ClientLookup::from_parts(client_id, email).ok_or(CheckError::NoIdentifierProvided)?;

        let token = self.authenticator().authenticate().await.map_err(|e| {
            warn!(error = %e, "Authentication failed before registration check");
            CheckError::AuthFailed
        })?;

        let versions = &ApiVersion::ALL;
        let last = versions[versions.len() - 1];

        let result = first_success(versions, Duration::ZERO, |version| {
            self.query_version(*version, *version == last, &lookup, &token)
        })
        .await;

        result.map_err(|exhausted| {
            let err = exhausted.into_last().unwrap_or_else(|| CheckError::ApiFailed {
                status: None,
                message: "No API versions configured".to_string(),
            });
            error!(error = %err, "All API requests failed");
            err
        })
    }

    #[instrument(skip(self, lookup, token), fields(version = version.as_str()))]
    async fn query_version(
        &self,
        version: ApiVersion,
        is_last: bool,
        lookup: &ClientLookup,
        token: &AuthToken,
    ) -> CheckResult<RegistrationCheck> {
        let url = self.endpoint().versioned(version, CLIENTS_PATH);
        info!(url = %url, "Checking client registration");

        let response = self.get_clients(&url, lookup, token).await?;
        match response.status {
            StatusCode::OK => Self::parse_report(&response.body, version),
            StatusCode::UNAUTHORIZED if is_last => {
                self.retry_after_unauthorized(&url, version, lookup, token)
                    .await
            }
            status => {
                warn!(
                    status = status.as_u16(),
                    body = %excerpt(&response.body),
                    "Clients request failed"
                );
                Err(CheckError::status(status.as_u16()))
            }
        }
    }

    async fn retry_after_unauthorized(
        &self,
        url: &str,
        version: ApiVersion,
        lookup: &ClientLookup,
        rejected: &AuthToken,
    ) -> CheckResult<RegistrationCheck> {
        info!("Token rejected, re-authenticating once");
        let fresh = self.authenticator().reauthenticate(rejected).await.map_err(|e| {
            warn!(error = %e, "Re-authentication failed");
            CheckError::AuthFailed
        })?;

        let response = self.get_clients(url, lookup, &fresh).await?;
        match response.status {
            StatusCode::OK => Self::parse_report(&response.body, version),
            StatusCode::UNAUTHORIZED => {
                self.authenticator().invalidate(&fresh).await;
                Err(CheckError::status(StatusCode::UNAUTHORIZED.as_u16()))
            }
            status => Err(CheckError::status(status.as_u16())),
        }
    }

    async fn get_clients(
        &self,
        url: &str,
        lookup: &ClientLookup,
        token: &AuthToken,
    ) -> CheckResult<crate::client::RawResponse> {
        let request = self
            .http()
            .get(url)
            .headers(self.authorized_headers(token, REPORTS_REFERER))
            .query(&[lookup.query()]);

        self.send(request).await.map_err(|e| CheckError::ApiFailed {
            status: None,
            message: format!("Error checking client registration: {}", e),
        })
    }

    fn parse_report(body: &str, version: ApiVersion) -> CheckResult<RegistrationCheck> {
        let report = ClientsReport::parse(body).map_err(|message| {
            warn!(body = %excerpt(body), "Unparsable clients report");
            CheckError::ApiFailed {
                status: Some(StatusCode::OK.as_u16()),
                message,
            }
        })?;

        let check = RegistrationCheck::from_report(report, version);
        debug!(is_registered = check.is_registered, "Clients report parsed");
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_from_report() {
        let body = r#"{"data":[{"client_account":"1"},{"client_account":"2"}]}"#;
        let report = ClientsReport::parse(body).unwrap();
        let check = RegistrationCheck::from_report(report, ApiVersion::V1);

        assert!(check.is_registered);
        assert_eq!(
            check.client_data.and_then(|c| c.client_account).as_deref(),
            Some("1")
        );

        let empty = RegistrationCheck::from_report(ClientsReport::default(), ApiVersion::V2);
        assert!(!empty.is_registered);
        assert!(empty.client_data.is_none());
    }

    proptest! {
        /// Property: a client is registered exactly when the report lists one
        #[test]
        fn prop_registered_iff_data_non_empty(id in "[0-9]{1,8}", len in 0usize..5) {
            let data: Vec<_> = (0..len).map(|_| json!({ "client_account": id })).collect();
            let body = json!({ "data": data }).to_string();
            let report = ClientsReport::parse(&body).expect("Reports always parse");

            let check = RegistrationCheck::from_report(report, ApiVersion::V1);

            prop_assert_eq!(check.is_registered, len > 0);
            prop_assert_eq!(check.client_data.is_some(), len > 0);
            if let Some(client) = check.client_data {
                prop_assert_eq!(client.client_account.as_deref(), Some(id.as_str()));
            }
        }
    }
}
