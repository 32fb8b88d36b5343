//! The validation service.
//!
//! A client id is checked against the clients report; an email alone is
//! checked against the affiliation endpoint. Whatever the check concludes is
//! normalized and written to the store, negative answers included. Only a
//! missing identifier, an authentication failure, or an exhausted
//! registration lookup end without a stored record.

use crate::error::{ValidationError, ValidationResult};
use crate::outcome::ValidationOutcome;
use crate::store::{MemoryValidationStore, ValidationRecord, ValidationStore};
use affiliate_client::{AffiliateClient, ClientConfig, ClientLookup};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Which check produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSource {
    Registration,
    Affiliation,
}

/// Result of one validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// The stored record.
    pub record: ValidationRecord,

    pub source: CheckSource,

    /// Link code from the affiliation endpoint, when it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_code: Option<String>,

    /// Message of a degraded affiliation check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl ValidationReport {
    /// Whether the client is registered or affiliated.
    pub fn is_registered(&self) -> bool {
        self.record.outcome.is_registered
    }
}

/// Client validation service.
#[derive(Clone)]
pub struct Validator {
    client: Arc<AffiliateClient>,
    store: Arc<dyn ValidationStore>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("client", &self.client)
            .finish()
    }
}

impl Validator {
    /// Create a validator over an existing client and store.
    pub fn new(client: Arc<AffiliateClient>, store: Arc<dyn ValidationStore>) -> Self {
        Self { client, store }
    }

    /// Create a validator with an in-memory store.
    pub fn in_memory(config: &ClientConfig) -> ValidationResult<Self> {
        let client = AffiliateClient::new(config)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(MemoryValidationStore::new()),
        ))
    }

    /// The affiliate API client.
    pub fn client(&self) -> &Arc<AffiliateClient> {
        &self.client
    }

    /// The result store.
    pub fn store(&self) -> &Arc<dyn ValidationStore> {
        &self.store
    }

    /// Validate a client by id or email and store the outcome.
    ///
    /// When both are given the client id is used and the email ignored.
    #[instrument(skip(self))]
    pub async fn validate(
        &self,
        client_id: Option<&str>,
        email: Option<&str>,
    ) -> ValidationResult<ValidationReport> {
        let lookup = ClientLookup::from_parts(client_id, email)
            .ok_or(ValidationError::NoIdentifierProvided)?;

        let (outcome, source, link_code, notice) = match &lookup {
            ClientLookup::ClientId(id) => {
                let check = self.client.check_registration(Some(id.as_str()), None).await?;
                let outcome = ValidationOutcome::from_registration(&lookup, &check);
                (outcome, CheckSource::Registration, None, None)
            }
            ClientLookup::Email(email) => {
                let check = self.client.check_affiliation(email).await?;
                if !check.is_success() {
                    warn!(
                        code = ?check.code,
                        message = ?check.message,
                        "Affiliation check degraded, recording as not affiliated"
                    );
                }
                let outcome = ValidationOutcome::from_affiliation(email, &check);
                let link_code = Some(check.link_code.clone()).filter(|c| !c.is_empty());
                let notice = if check.is_success() { None } else { check.message.clone() };
                (outcome, CheckSource::Affiliation, link_code, notice)
            }
        };

        let record = self.store.upsert(outcome).await?;
        info!(
            client_key = %record.client_key(),
            is_registered = record.outcome.is_registered,
            source = ?source,
            "Validation recorded"
        );

        Ok(ValidationReport {
            record,
            source,
            link_code,
            notice,
        })
    }
}
