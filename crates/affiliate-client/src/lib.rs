//! # Affiliate Client
//!
//! HTTP client for the upstream affiliate API.
//!
//! ## Overview
//!
//! The affiliate-client crate handles:
//! - **Configuration**: Environment-driven endpoint, credentials and timeouts
//! - **Registration checks**: Clients report lookup by client id or email
//! - **Affiliation checks**: Affiliation lookup by email
//! - **Response parsing**: Normalization of the upstream's loose body shapes
//!
//! ## Checks
//!
//! - `check_registration(client_id, email)`: tries each API version (v1, then
//!   v2) until one answers 200. Exhaustion is an error.
//! - `check_affiliation(email)`: a single endpoint. A 404 means "not
//!   affiliated"; other failures are reported as degraded outcomes.
//!
//! Both obtain a token from the shared [`Authenticator`](affiliate_auth::Authenticator)
//! and retry once with a fresh token after a 401.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use affiliate_client::{AffiliateClient, ClientConfig};
//!
//! async fn run() -> Result<(), affiliate_client::CheckError> {
//!     let config = ClientConfig::from_env();
//!     config.validate_for_production()?;
//!
//!     let client = AffiliateClient::new(&config)?;
//!     let registration = client.check_registration(Some("12345"), None).await?;
//!     println!("registered: {}", registration.is_registered);
//!
//!     let affiliation = client.check_affiliation("a@b.com").await?;
//!     println!("affiliated: {}", affiliation.is_affiliated);
//!     Ok(())
//! }
//! ```

pub mod checks;
pub mod client;
pub mod config;
pub mod error;
pub mod response;

// Re-export main types
pub use checks::{
    AffiliationCheck, AffiliationFailure, CheckStatus, ClientLookup, RegistrationCheck,
};
pub use client::AffiliateClient;
pub use config::{ClientConfig, ConfigError, DEFAULT_AFFILIATION_PATH, DEFAULT_API_URL};
pub use error::{CheckError, CheckResult};
pub use response::{account_id, AffiliationBody, AffiliationSignal, ClientRecord, ClientsReport};
