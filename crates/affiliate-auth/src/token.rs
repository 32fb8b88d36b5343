//! Bearer tokens issued by the affiliate API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Validity window applied to every freshly obtained token.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Cookie name to value mapping captured during login.
pub type CookieMap = HashMap<String, String>;

/// A bearer token together with the session cookies it was issued with.
///
/// The value is never empty: strategies that see an empty `token` field
/// treat the attempt as failed and never build an `AuthToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Opaque bearer string
    pub value: String,

    /// Session cookies, empty when the strategy produced none
    #[serde(default)]
    pub cookies: CookieMap,

    /// Token is valid while `now < expires_at`
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// Create a token acquired now, valid for [`TOKEN_LIFETIME_HOURS`].
    ///
    /// Returns `None` for an empty value.
    pub fn issue(value: impl Into<String>, cookies: CookieMap) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            return None;
        }

        Some(Self {
            value,
            cookies,
            expires_at: Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS),
        })
    }

    /// Check whether the token has reached its expiry.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against an explicit instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

/// Render cookies as a single `Cookie` request header value.
///
/// Names are sorted so the header is stable across calls.
pub fn cookie_header(cookies: &CookieMap) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    let mut pairs: Vec<_> = cookies.iter().collect();
    pairs.sort();
    Some(
        pairs
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Parse a `Cookie` header value (`a=1; b=2`) back into a map.
pub fn parse_cookie_header(header: &str) -> CookieMap {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
