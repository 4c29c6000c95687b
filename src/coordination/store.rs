//! Typed adapter between lock records and the raw key-value backend.

use std::sync::Arc;

use crate::api::{CasOutcome, KeyValueStore};
use crate::coordination::error::CoordinationError;
use crate::coordination::types::{LockRecord, WritePredicate};

/// Reads and conditionally writes [`LockRecord`]s through the backend port.
///
/// Records are stored as JSON. The predicate of a conditional write is
/// expressed as the serialized prior record, so the backend's byte-level
/// compare-and-swap carries the record-level semantics unchanged. No retry
/// and no business logic live here.
pub struct LockRecordStore<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> LockRecordStore<S> {
    /// Wrap a backend.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Strongly consistent read of the record for `key`.
    ///
    /// A stored value that does not parse as a record is surfaced as
    /// [`CoordinationError::CorruptedRecord`], never silently dropped.
    pub async fn read(&self, key: &str) -> Result<Option<LockRecord>, CoordinationError> {
        match self.store.read(key).await? {
            Some(raw) => {
                let record = serde_json::from_str(&raw).map_err(|e| {
                    CoordinationError::CorruptedRecord {
                        key: key.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Conditionally write `record`, constrained by `predicate`.
    pub async fn write(
        &self,
        predicate: &WritePredicate,
        record: &LockRecord,
    ) -> Result<CasOutcome, CoordinationError> {
        let expected = match predicate {
            WritePredicate::Absent => None,
            WritePredicate::Matches(prior) => Some(serde_json::to_string(prior)?),
        };
        let new_value = serde_json::to_string(record)?;
        let outcome = self
            .store
            .compare_and_swap(&record.key, expected.as_deref(), &new_value)
            .await?;
        Ok(outcome)
    }
}
