//! Browser-automation login capability.
//!
//! Driving a real browser is left to the embedding application. The
//! authenticator only sees this trait and calls it once, after every direct
//! strategy has failed.

use crate::credentials::Credentials;
use crate::token::CookieMap;
use async_trait::async_trait;

/// What a browser login managed to capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserSession {
    /// Token read from the page, if one was found
    pub token: Option<String>,

    /// Cookies present after login
    pub cookies: CookieMap,
}

impl BrowserSession {
    /// Session with a token.
    pub fn with_token(token: impl Into<String>, cookies: CookieMap) -> Self {
        Self {
            token: Some(token.into()),
            cookies,
        }
    }

    /// Session that produced cookies only.
    pub fn cookies_only(cookies: CookieMap) -> Self {
        Self {
            token: None,
            cookies,
        }
    }
}

/// Best-effort login through a scripted browser.
#[async_trait]
pub trait BrowserLogin: Send + Sync {
    /// Log in and return whatever was captured, or `None` on failure.
    async fn login(&self, credentials: &Credentials) -> Option<BrowserSession>;
}
