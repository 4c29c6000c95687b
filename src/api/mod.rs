//! Port onto the external key-value backend.
//!
//! The backend is the only durable state this crate depends on. It must offer
//! strongly consistent reads and atomic per-key conditional writes; nothing
//! else is assumed — no cross-key transactions, no ordering between keys, no
//! leases or TTLs.

use async_trait::async_trait;
use thiserror::Error;

pub mod inmemory;
pub use inmemory::DeterministicKeyValueStore;

/// Outcome of a conditional write.
///
/// Losing a compare-and-swap race is expected, frequent control flow, so it
/// is a tagged outcome rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write was applied atomically.
    Committed,
    /// The stored value did not match the expected prior state; nothing was
    /// written.
    Conflict,
}

/// Errors from the key-value backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyValueStoreError {
    /// The backend could not be reached.
    #[error("key-value backend unreachable: {reason}")]
    Unavailable { reason: String },
    /// The backend was reached but refused or failed the operation.
    #[error("operation failed: {reason}")]
    Failed { reason: String },
}

/// A strongly consistent key-value backend with per-key atomic
/// compare-and-swap.
///
/// Under concurrent conflicting conditional writes to one key the backend
/// must commit at most one and report [`CasOutcome::Conflict`] to the rest.
/// That guarantee is the single serialization point everything above this
/// trait relies on.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the current value for `key`. Must not return stale data.
    async fn read(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Atomically write `new_value` if the stored value still matches
    /// `expected` at the moment of the write (`None` meaning the key must not
    /// exist yet).
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new_value: &str,
    ) -> Result<CasOutcome, KeyValueStoreError>;
}
