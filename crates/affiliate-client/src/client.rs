//! The long-lived affiliate API client.
//!
//! One [`AffiliateClient`] owns the HTTP client and the [`Authenticator`]
//! (and through it the credential cache). The registration and affiliation
//! checks are implemented on it in [`crate::checks`].

use crate::config::ClientConfig;
use crate::error::{CheckError, CheckResult};
use affiliate_auth::{
    cookie_header, ApiEndpoint, AuthSession, AuthToken, Authenticator, BrowserLogin,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// Raw upstream answer: status plus body text.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Affiliate API client.
#[derive(Clone)]
pub struct AffiliateClient {
    /// HTTP client instance.
    client: Client,

    /// Token source and credential cache.
    auth: Arc<Authenticator>,

    /// Upstream host.
    endpoint: ApiEndpoint,

    /// Path of the affiliation endpoint.
    affiliation_path: String,
}

impl std::fmt::Debug for AffiliateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffiliateClient")
            .field("endpoint", &self.endpoint)
            .field("affiliation_path", &self.affiliation_path)
            .field("auth", &self.auth)
            .finish()
    }
}

impl AffiliateClient {
    /// Create a client without a browser login fallback.
    pub fn new(config: &ClientConfig) -> CheckResult<Self> {
        Self::build(config, None)
    }

    /// Create a client with a browser login fallback.
    pub fn with_browser(
        config: &ClientConfig,
        browser: Arc<dyn BrowserLogin>,
    ) -> CheckResult<Self> {
        Self::build(config, Some(browser))
    }

    fn build(config: &ClientConfig, browser: Option<Arc<dyn BrowserLogin>>) -> CheckResult<Self> {
        let credentials = config.require_credentials()?.clone();
        let http = config.http_settings();
        let client = http
            .build_client(None)
            .map_err(|e| CheckError::Client(e.to_string()))?;

        let mut auth =
            Authenticator::with_client(client.clone(), config.api.clone(), credentials, http)
                .with_attempt_spacing(config.login_spacing());
        if let Some(browser) = browser {
            auth = auth.with_browser(browser);
        }

        Ok(Self {
            client,
            auth: Arc::new(auth),
            endpoint: config.api.clone(),
            affiliation_path: config.affiliation_path.clone(),
        })
    }

    /// The authenticator.
    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// The credential cache.
    pub fn session(&self) -> &Arc<AuthSession> {
        self.auth.session()
    }

    pub(crate) fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    pub(crate) fn affiliation_path(&self) -> &str {
        &self.affiliation_path
    }

    pub(crate) fn affiliation_url(&self) -> String {
        self.endpoint.url(&self.affiliation_path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Browser-like headers plus bearer token and cookies.
    pub(crate) fn authorized_headers(&self, token: &AuthToken, referer_path: &str) -> HeaderMap {
        let mut headers = self.endpoint.browser_headers(referer_path);

        if let Ok(value) = HeaderValue::from_str(&token.bearer()) {
            headers.insert(AUTHORIZATION, value);
        }
        let cookies = cookie_header(&token.cookies).and_then(|c| HeaderValue::from_str(&c).ok());
        if let Some(value) = cookies {
            headers.insert(COOKIE, value);
        }

        headers
    }

    /// Send a request and read the whole body as text.
    pub(crate) async fn send(&self, request: RequestBuilder) -> reqwest::Result<RawResponse> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Upstream response");

        Ok(RawResponse { status, body })
    }
}
