//! Token acquisition with an ordered login fallback chain.
//!
//! Order of operations for [`Authenticator::authenticate`]:
//!
//! 0. Return the cached token when it is present and unexpired.
//! 1. Walk the configured [`LoginStrategy`] chain (web session first, then
//!    direct API logins), spacing direct attempts by a fixed delay.
//!    Transport errors and rejected logins move on to the next strategy.
//! 2. Ask the [`BrowserLogin`] capability, if one is installed.
//! 3. Fail with [`AuthError::AuthFailed`].
//!
//! Logins are serialized: concurrent callers that find the cache empty wait
//! for the first login and then reuse its token.

use crate::browser::{BrowserLogin, BrowserSession};
use crate::credentials::Credentials;
use crate::endpoint::{ApiEndpoint, HttpSettings};
use crate::error::{excerpt, AuthError, AuthResult};
use crate::fallback::first_success;
use crate::session::AuthSession;
use crate::strategy::LoginStrategy;
use crate::token::{parse_cookie_header, AuthToken, CookieMap};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Delay between consecutive direct login attempts.
///
/// The web-session login is not delayed, nor is the first direct login.
pub const DEFAULT_ATTEMPT_SPACING: Duration = Duration::from_secs(1);

/// Obtains and caches bearer tokens for the affiliate API account.
pub struct Authenticator {
    /// Shared HTTP client for direct logins
    client: Client,

    /// Upstream host
    endpoint: ApiEndpoint,

    /// Account credentials
    credentials: Credentials,

    /// Transport settings, reused for per-login cookie clients
    http: HttpSettings,

    /// Credential cache
    session: Arc<AuthSession>,

    /// Login strategies in the order they are tried
    strategies: Vec<LoginStrategy>,

    /// Last-resort login capability
    browser: Option<Arc<dyn BrowserLogin>>,

    /// Delay between login attempts
    attempt_spacing: Duration,

    /// Serializes logins
    login_lock: Mutex<()>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("strategies", &self.strategies.len())
            .field("browser", &self.browser.is_some())
            .finish()
    }
}

impl Authenticator {
    /// Create an authenticator with the default strategy chain.
    pub fn new(
        endpoint: ApiEndpoint,
        credentials: Credentials,
        http: HttpSettings,
    ) -> AuthResult<Self> {
        let client = http.build_client(None)?;
        Ok(Self::with_client(client, endpoint, credentials, http))
    }

    /// Create an authenticator around an existing HTTP client.
    pub fn with_client(
        client: Client,
        endpoint: ApiEndpoint,
        credentials: Credentials,
        http: HttpSettings,
    ) -> Self {
        Self {
            client,
            endpoint,
            credentials,
            http,
            session: Arc::new(AuthSession::new()),
            strategies: LoginStrategy::default_chain(),
            browser: None,
            attempt_spacing: DEFAULT_ATTEMPT_SPACING,
            login_lock: Mutex::new(()),
        }
    }

    /// Replace the strategy chain.
    pub fn with_strategies(mut self, strategies: Vec<LoginStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Install a browser login fallback.
    pub fn with_browser(mut self, browser: Arc<dyn BrowserLogin>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Set the delay between login attempts.
    pub fn with_attempt_spacing(mut self, spacing: Duration) -> Self {
        self.attempt_spacing = spacing;
        self
    }

    /// Share an existing credential cache.
    pub fn with_session(mut self, session: Arc<AuthSession>) -> Self {
        self.session = session;
        self
    }

    /// The credential cache.
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// The upstream host.
    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    /// Return a valid token, logging in only when the cache has none.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> AuthResult<AuthToken> {
        if let Some(token) = self.session.get().await {
            return Ok(token);
        }

        let _guard = self.login_lock.lock().await;

        // Another caller may have logged in while we waited.
        if let Some(token) = self.session.get().await {
            debug!("Reusing token obtained by a concurrent login");
            return Ok(token);
        }

        self.login().await
    }

    /// Drop a token the upstream rejected and log in again.
    #[instrument(skip(self, rejected))]
    pub async fn reauthenticate(&self, rejected: &AuthToken) -> AuthResult<AuthToken> {
        self.invalidate(rejected).await;
        self.authenticate().await
    }

    /// Drop a token the upstream rejected.
    pub async fn invalidate(&self, rejected: &AuthToken) -> bool {
        let cleared = self.session.invalidate(rejected).await;
        if cleared {
            info!("Cleared rejected token from cache");
        }
        cleared
    }

    async fn login(&self) -> AuthResult<AuthToken> {
        // Only direct logins are spaced; the web session goes straight through.
        let mut direct_attempts = 0usize;
        let chain = first_success(&self.strategies, Duration::ZERO, |strategy| {
            let delay = if strategy.uses_cookies() {
                Duration::ZERO
            } else {
                direct_attempts += 1;
                if direct_attempts > 1 {
                    self.attempt_spacing
                } else {
                    Duration::ZERO
                }
            };
            async move {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                self.attempt(strategy).await
            }
        })
        .await;

        match chain {
            Ok(token) => {
                self.session.set(token.clone()).await;
                // Direct logins carry no cookies; pick up any the cache kept.
                return Ok(self.session.get().await.unwrap_or(token));
            }
            Err(exhausted) => {
                warn!(
                    attempts = exhausted.attempts(),
                    "All API login strategies failed"
                );
            }
        }

        if let Some(token) = self.browser_login().await {
            return Ok(token);
        }

        error!("All authentication methods failed");
        Err(AuthError::AuthFailed)
    }

    #[instrument(skip(self, strategy), fields(strategy = %strategy))]
    async fn attempt(&self, strategy: &LoginStrategy) -> AuthResult<AuthToken> {
        let url = self.endpoint.versioned(strategy.version(), strategy.path());
        let field = strategy.field().as_str();
        debug!(payload = %self.credentials.masked_payload(field), "Login payload");

        let token = match strategy {
            LoginStrategy::WebSession { login_page, .. } => {
                self.web_session_login(login_page, &url, field).await?
            }
            LoginStrategy::Direct { .. } => {
                let response = self
                    .client
                    .post(&url)
                    .headers(self.endpoint.browser_headers("/"))
                    .json(&self.credentials.payload(field))
                    .send()
                    .await?;
                let value = Self::extract_token(response).await?;
                AuthToken::issue(value, CookieMap::new()).ok_or(AuthError::AuthFailed)?
            }
        };

        info!("Obtained auth token");
        Ok(token)
    }

    async fn web_session_login(
        &self,
        login_page: &str,
        login_url: &str,
        field: &str,
    ) -> AuthResult<AuthToken> {
        let jar = Arc::new(Jar::default());
        let client = self.http.build_client(Some(jar.clone()))?;
        let headers = self.endpoint.browser_headers("/");

        let page = client
            .get(self.endpoint.url(login_page))
            .headers(headers.clone())
            .send()
            .await?;
        debug!(status = page.status().as_u16(), "Fetched login page");

        let response = client
            .post(login_url)
            .headers(headers)
            .json(&self.credentials.payload(field))
            .send()
            .await?;
        let value = Self::extract_token(response).await?;

        // Cookies set by the login page may be scoped to its own path.
        let mut cookies = CookieMap::new();
        for url in [self.endpoint.url(login_page), login_url.to_string()] {
            let header = Url::parse(&url).ok().and_then(|url| jar.cookies(&url));
            if let Some(Ok(value)) = header.as_ref().map(|h| h.to_str()) {
                cookies.extend(parse_cookie_header(value));
            }
        }
        debug!(cookies = cookies.len(), "Captured session cookies");

        AuthToken::issue(value, cookies).ok_or(AuthError::AuthFailed)
    }

    /// Pull a non-empty `token` field out of a 200 JSON body.
    async fn extract_token(response: Response) -> AuthResult<String> {
        let status = response.status();
        debug!(status = status.as_u16(), "Login response");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::LoginRejected {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        let body: Value = response.json().await.map_err(|e| AuthError::LoginRejected {
            status: status.as_u16(),
            message: format!("Failed to parse login response: {}", e),
        })?;

        match body.get("token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(AuthError::LoginRejected {
                status: status.as_u16(),
                message: "Token not found in response".to_string(),
            }),
        }
    }

    async fn browser_login(&self) -> Option<AuthToken> {
        let browser = self.browser.as_ref()?;
        info!("Attempting browser login as last resort");

        let Some(BrowserSession { token, cookies }) = browser.login(&self.credentials).await
        else {
            warn!("Browser login returned nothing");
            return None;
        };

        if let Some(token) = token.and_then(|value| AuthToken::issue(value, cookies.clone())) {
            info!("Obtained auth token via browser login");
            self.session.set(token.clone()).await;
            return Some(token);
        }

        if !cookies.is_empty() {
            info!(
                cookies = cookies.len(),
                "Browser login produced cookies but no token"
            );
            self.session.set_cookies(cookies).await;
        }

        None
    }
}
