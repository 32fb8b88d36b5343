//! # Affiliate Auth
//!
//! Upstream authentication for the affiliate validator.
//!
//! ## Overview
//!
//! The affiliate-auth crate handles:
//! - **Tokens**: Bearer tokens with a fixed 24 hour validity window
//! - **Session cache**: A single shared slot for the current token and cookies
//! - **Login strategies**: Ordered descriptors for each way of logging in
//! - **Fallback chains**: A generic "try each until one succeeds" loop
//! - **Browser login**: A capability trait used as the last resort
//!
//! ## Usage
//!
//! ```rust,no_run
//! use affiliate_auth::{ApiEndpoint, Authenticator, Credentials, HttpSettings};
//!
//! async fn token() -> Result<String, affiliate_auth::AuthError> {
//!     let authenticator = Authenticator::new(
//!         ApiEndpoint::new("https://my.exnessaffiliates.com"),
//!         Credentials::new("ops@example.com", "secret"),
//!         HttpSettings::default(),
//!     )?;
//!
//!     // The second call is served from the cache.
//!     authenticator.authenticate().await?;
//!     let token = authenticator.authenticate().await?;
//!     Ok(token.value)
//! }
//! ```

pub mod authenticator;
pub mod browser;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod fallback;
pub mod session;
pub mod strategy;
pub mod token;

// Re-export main types
pub use authenticator::{Authenticator, DEFAULT_ATTEMPT_SPACING};
pub use browser::{BrowserLogin, BrowserSession};
pub use credentials::{Credentials, PASSWORD_MASK};
pub use endpoint::{ApiEndpoint, ApiVersion, HttpSettings};
pub use error::{excerpt, AuthError, AuthResult};
pub use fallback::{first_success, Exhausted};
pub use session::AuthSession;
pub use strategy::{CredentialField, LoginStrategy};
pub use token::{cookie_header, AuthToken, CookieMap, TOKEN_LIFETIME_HOURS};
