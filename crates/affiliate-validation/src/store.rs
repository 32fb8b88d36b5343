//! Validation result storage.
//!
//! Records are keyed uniquely by client key. Writing an outcome for a key
//! that already has a record overwrites the record's fields in place; the
//! record's id and creation time are kept.

use crate::error::{StoreError, StoreResult};
use crate::outcome::ValidationOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A stored validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Record ID
    pub id: Uuid,

    /// Latest outcome for the key
    #[serde(flatten)]
    pub outcome: ValidationOutcome,

    /// When the key was first validated
    pub created_at: DateTime<Utc>,

    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl ValidationRecord {
    /// Create a new record for an outcome.
    pub fn new(outcome: ValidationOutcome) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            outcome,
            created_at: now,
            updated_at: now,
        }
    }

    /// Key the record is stored under.
    pub fn client_key(&self) -> &str {
        &self.outcome.client_key
    }

    fn overwrite(&mut self, outcome: ValidationOutcome) {
        self.outcome = outcome;
        self.updated_at = Utc::now();
    }
}

/// Result sink for validation outcomes.
#[async_trait]
pub trait ValidationStore: Send + Sync {
    /// Create or update the record for the outcome's client key.
    async fn upsert(&self, outcome: ValidationOutcome) -> StoreResult<ValidationRecord>;

    /// Get the record for a client key.
    async fn get(&self, client_key: &str) -> StoreResult<Option<ValidationRecord>>;

    /// All records, most recently updated first.
    async fn list(&self) -> StoreResult<Vec<ValidationRecord>>;

    /// Number of stored records.
    async fn count(&self) -> StoreResult<usize>;
}

/// In-memory validation store.
///
/// Suitable for single-process deployments and testing. Records do not
/// survive a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryValidationStore {
    records: Arc<RwLock<HashMap<String, ValidationRecord>>>,
}

impl MemoryValidationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValidationStore for MemoryValidationStore {
    async fn upsert(&self, outcome: ValidationOutcome) -> StoreResult<ValidationRecord> {
        if outcome.client_key.trim().is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut records = self.records.write().await;
        let record = match records.get_mut(&outcome.client_key) {
            Some(existing) => {
                debug!(client_key = %outcome.client_key, "Updating validation record");
                existing.overwrite(outcome);
                existing.clone()
            }
            None => {
                debug!(client_key = %outcome.client_key, "Creating validation record");
                let record = ValidationRecord::new(outcome);
                records.insert(record.client_key().to_string(), record.clone());
                record
            }
        };

        Ok(record)
    }

    async fn get(&self, client_key: &str) -> StoreResult<Option<ValidationRecord>> {
        Ok(self.records.read().await.get(client_key).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<ValidationRecord>> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_creates_then_overwrites() {
        let store = MemoryValidationStore::new();

        let first = store
            .upsert(ValidationOutcome::unregistered("12345"))
            .await
            .unwrap();

        let mut registered = ValidationOutcome::unregistered("12345");
        registered.is_registered = true;
        registered.account_type = Some("Standard".to_string());
        let second = store.upsert(registered.clone()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.outcome, registered);

        let stored = store.get("12345").await.unwrap().unwrap();
        assert!(stored.outcome.is_registered);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = MemoryValidationStore::new();
        let result = store.upsert(ValidationOutcome::unregistered("  ")).await;

        assert!(matches!(result, Err(StoreError::EmptyKey)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryValidationStore::new();
        store.upsert(ValidationOutcome::unregistered("a")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.upsert(ValidationOutcome::unregistered("b")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.upsert(ValidationOutcome::unregistered("a")).await.unwrap();

        let keys: Vec<_> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.client_key().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = ValidationRecord::new(ValidationOutcome::unregistered("12345"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["client_key"], "12345");
        assert_eq!(json["is_registered"], false);
        assert!(json.get("outcome").is_none());
    }
}
