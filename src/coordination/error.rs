//! Error types for the coordination layer.

use snafu::Snafu;

use crate::api::KeyValueStoreError;

/// Errors from coordinating one notification.
///
/// Skipping a stale or contended event is not an error; these are the
/// failures that must reach the caller so the notification can be redelivered
/// or routed to an operator-visible failure channel.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoordinationError {
    /// The bounded retry budget ran out while racing for the lock.
    #[snafu(display("lock acquisition for '{key}' exhausted after {attempts} attempts"))]
    AcquireExhausted {
        /// The contended lock key.
        key: String,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The processing callback failed. The lock was released and the
    /// sequencer rolled back before this was returned.
    #[snafu(display("processing for '{key}' failed: {source}"))]
    Processing {
        /// The lock key whose callback failed.
        key: String,
        /// The callback's own error, unchanged.
        #[snafu(source(false))]
        source: anyhow::Error,
    },

    /// Data in storage is not a valid lock record.
    #[snafu(display("corrupted record for key '{key}': {reason}"))]
    CorruptedRecord {
        /// The key with corrupted data.
        key: String,
        /// What failed to parse.
        reason: String,
    },

    /// Underlying storage error.
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The backend error.
        source: KeyValueStoreError,
    },

    /// Record serialization failed.
    #[snafu(display("serialization error: {source}"))]
    Serialization {
        /// The underlying error.
        source: serde_json::Error,
    },
}

impl From<KeyValueStoreError> for CoordinationError {
    fn from(source: KeyValueStoreError) -> Self {
        CoordinationError::Storage { source }
    }
}

impl From<serde_json::Error> for CoordinationError {
    fn from(source: serde_json::Error) -> Self {
        CoordinationError::Serialization { source }
    }
}
