//! # Affiliate Validation
//!
//! Client validation for the affiliate program.
//!
//! ## Overview
//!
//! The affiliate-validation crate handles:
//! - **Validation**: Running the right upstream check for an identifier
//! - **Normalization**: Collapsing registration and affiliation into one outcome
//! - **Storage**: Upserting outcomes by client key
//!
//! ## Usage
//!
//! ```rust,no_run
//! use affiliate_client::ClientConfig;
//! use affiliate_validation::Validator;
//!
//! async fn validate() -> Result<(), affiliate_validation::ValidationError> {
//!     let validator = Validator::in_memory(&ClientConfig::from_env())?;
//!
//!     let report = validator.validate(Some("12345"), None).await?;
//!     println!(
//!         "{} registered: {}",
//!         report.record.client_key(),
//!         report.is_registered()
//!     );
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod outcome;
pub mod store;
pub mod validator;

// Re-export main types
pub use error::{StoreError, StoreResult, ValidationError, ValidationResult};
pub use outcome::{parse_reg_date, ValidationOutcome, AFFILIATED_ACCOUNT_TYPE};
pub use store::{MemoryValidationStore, ValidationRecord, ValidationStore};
pub use validator::{CheckSource, ValidationReport, Validator};
