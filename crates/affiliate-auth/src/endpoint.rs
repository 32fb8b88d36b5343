//! Upstream endpoint addressing and request headers.

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::cookie::Jar;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// User agent presented to the upstream, which filters obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Known API versions, in the order they are tried.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApiVersion {
    /// `/api`
    V1,
    /// `/api/v2`
    V2,
}

impl ApiVersion {
    /// All versions in fallback order.
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1, ApiVersion::V2];

    /// Path prefix for this version.
    pub fn base_path(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api",
            ApiVersion::V2 => "/api/v2",
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

/// Base address of the affiliate API host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Base URL (e.g., "https://my.exnessaffiliates.com")
    pub base_url: String,
}

impl ApiEndpoint {
    /// Create an endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Build a URL under a versioned API prefix.
    pub fn versioned(&self, version: ApiVersion, path: &str) -> String {
        let path = path.trim_start_matches('/');
        self.url(&format!("{}/{}", version.base_path(), path))
    }

    /// Browser-like headers for a request made from `referer_path`.
    pub fn browser_headers(&self, referer_path: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let origin = self.base_url.trim_end_matches('/');
        if let Ok(value) = HeaderValue::from_str(origin) {
            headers.insert(ORIGIN, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.url(referer_path)) {
            headers.insert(REFERER, value);
        }

        headers
    }
}

/// Transport settings shared by every outbound call.
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    /// Per-request timeout
    pub timeout: Duration,

    /// Whether to verify TLS certificates (disable only for testing)
    pub verify_tls: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            verify_tls: true,
        }
    }
}

impl HttpSettings {
    /// Build an HTTP client, optionally backed by a cookie jar.
    pub fn build_client(&self, jar: Option<Arc<Jar>>) -> reqwest::Result<Client> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_tls);

        if let Some(jar) = jar {
            builder = builder.cookie_provider(jar);
        }

        builder.build()
    }
}
