//! In-memory implementation of [`KeyValueStore`] for testing.
//!
//! Deterministic and non-persistent. Mirrors the behavior of a production
//! backend without network or disk I/O, which makes it suitable for unit
//! tests and for simulating many concurrent callers in one process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CasOutcome, KeyValueStore, KeyValueStoreError};

/// In-memory deterministic implementation of [`KeyValueStore`].
///
/// Values live in a `HashMap` behind a single mutex, so each operation is
/// atomic with respect to every other. The conditional-write semantics match
/// a production backend's: the expected value is compared against the stored
/// bytes at the moment of the write.
#[derive(Clone, Default)]
pub struct DeterministicKeyValueStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl DeterministicKeyValueStore {
    /// Create a new empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl KeyValueStore for DeterministicKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new_value: &str,
    ) -> Result<CasOutcome, KeyValueStoreError> {
        let mut inner = self.inner.lock().await;
        let current = inner.get(key);
        let condition_matches = match (expected, current) {
            (None, None) => true,
            (Some(exp), Some(cur)) => exp == cur,
            _ => false,
        };
        if condition_matches {
            inner.insert(key.to_string(), new_value.to_string());
            Ok(CasOutcome::Committed)
        } else {
            Ok(CasOutcome::Conflict)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_if_absent() {
        let store = DeterministicKeyValueStore::new();
        let outcome = store.compare_and_swap("k", None, "v1").await.unwrap();
        assert_eq!(outcome, CasOutcome::Committed);
        assert_eq!(store.read("k").await.unwrap(), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_create_conflicts_when_present() {
        let store = DeterministicKeyValueStore::new();
        store.compare_and_swap("k", None, "v1").await.unwrap();
        let outcome = store.compare_and_swap("k", None, "v2").await.unwrap();
        assert_eq!(outcome, CasOutcome::Conflict);
        assert_eq!(store.read("k").await.unwrap(), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_swap_requires_exact_match() {
        let store = DeterministicKeyValueStore::new();
        store.compare_and_swap("k", None, "v1").await.unwrap();

        let outcome = store.compare_and_swap("k", Some("stale"), "v2").await.unwrap();
        assert_eq!(outcome, CasOutcome::Conflict);

        let outcome = store.compare_and_swap("k", Some("v1"), "v2").await.unwrap();
        assert_eq!(outcome, CasOutcome::Committed);
        assert_eq!(store.read("k").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let store = DeterministicKeyValueStore::new();
        assert_eq!(store.read("missing").await.unwrap(), None);
    }
}
