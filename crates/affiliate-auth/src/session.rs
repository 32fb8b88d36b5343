//! Credential cache shared by every check issued through one client.
//!
//! The session holds at most one token. Reads only ever hand out a token
//! that is present and unexpired; the cookie slot lives independently of the
//! token so a browser login that produced cookies alone can still be
//! recorded.

use crate::token::{AuthToken, CookieMap};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    cookies: CookieMap,
}

/// Single-slot token cache guarded by an async lock.
#[derive(Debug, Default)]
pub struct AuthSession {
    state: RwLock<SessionState>,
}

impl AuthSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached token if it is still valid.
    pub async fn get(&self) -> Option<AuthToken> {
        let state = self.state.read().await;
        let value = state.token.clone()?;
        let expires_at = state.expires_at?;

        if Utc::now() >= expires_at {
            return None;
        }

        Some(AuthToken {
            value,
            cookies: state.cookies.clone(),
            expires_at,
        })
    }

    /// Store a token.
    ///
    /// Empty token cookies leave previously captured cookies in place.
    pub async fn set(&self, token: AuthToken) {
        let mut state = self.state.write().await;
        state.token = Some(token.value);
        state.expires_at = Some(token.expires_at);
        if !token.cookies.is_empty() {
            state.cookies = token.cookies;
        }
    }

    /// Store cookies without a token (degraded browser login).
    pub async fn set_cookies(&self, cookies: CookieMap) {
        self.state.write().await.cookies = cookies;
    }

    /// Cookies currently held, whether or not a token is cached.
    pub async fn cookies(&self) -> CookieMap {
        self.state.read().await.cookies.clone()
    }

    /// Drop the token and its expiry. Cookies are kept.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.token = None;
        state.expires_at = None;
    }

    /// Clear the slot only if it still holds `rejected`.
    ///
    /// Returns `true` when the slot was cleared. A token stored by another
    /// request after `rejected` was handed out is left alone.
    pub async fn invalidate(&self, rejected: &AuthToken) -> bool {
        let mut state = self.state.write().await;
        if state.token.as_deref() != Some(rejected.value.as_str()) {
            debug!("Cached token already replaced, skipping invalidation");
            return false;
        }

        state.token = None;
        state.expires_at = None;
        true
    }

    /// Whether any token value is stored, expired or not.
    pub async fn has_token(&self) -> bool {
        self.state.read().await.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(value: &str) -> AuthToken {
        AuthToken::issue(value, CookieMap::new()).unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let session = AuthSession::new();
        assert!(session.get().await.is_none());

        session.set(token("t1")).await;
        assert_eq!(session.get().await.unwrap().value, "t1");
    }

    #[tokio::test]
    async fn test_expired_token_is_not_returned() {
        let session = AuthSession::new();
        let mut stale = token("t1");
        stale.expires_at = Utc::now() - Duration::hours(1);

        session.set(stale).await;
        assert!(session.get().await.is_none());
        assert!(session.has_token().await);
    }

    #[tokio::test]
    async fn test_clear_keeps_cookies() {
        let session = AuthSession::new();
        let mut cookies = CookieMap::new();
        cookies.insert("sessionid".to_string(), "abc".to_string());

        session.set(AuthToken::issue("t1", cookies.clone()).unwrap()).await;
        session.clear().await;

        assert!(session.get().await.is_none());
        assert_eq!(session.cookies().await, cookies);
    }

    #[tokio::test]
    async fn test_token_without_cookies_keeps_existing_cookies() {
        let session = AuthSession::new();
        let mut cookies = CookieMap::new();
        cookies.insert("sessionid".to_string(), "abc".to_string());
        session.set_cookies(cookies.clone()).await;

        session.set(token("t1")).await;
        assert_eq!(session.get().await.unwrap().cookies, cookies);
    }

    #[tokio::test]
    async fn test_invalidate_only_clears_matching_token() {
        let session = AuthSession::new();
        let old = token("old");
        let new = token("new");

        session.set(new.clone()).await;
        assert!(!session.invalidate(&old).await);
        assert_eq!(session.get().await.unwrap().value, "new");

        assert!(session.invalidate(&new).await);
        assert!(session.get().await.is_none());
    }
}
