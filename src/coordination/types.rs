//! Shared types for the coordination layer.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

/// Opaque ordering token attached to a change notification.
///
/// Tokens are compared byte-wise lexicographically and are never parsed,
/// reordered, or reformatted; a higher token means a more recent change.
/// A comparison is only meaningful between tokens emitted for the same key
/// and the same resource version — callers must not compare across scopes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequencer(String);

impl Sequencer {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte-wise lexicographic comparison against another token from the
    /// same scope.
    pub fn compare(&self, other: &Sequencer) -> Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl std::fmt::Display for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable per-key lock state.
///
/// One record per lock key, created on the first eligible event for that key
/// and never deleted afterwards: removing a record would also remove the
/// create/delete ordering history it carries, letting a stale create outrun a
/// recorded delete.
///
/// Serialized as JSON for human readability and debugging. The serialized
/// form doubles as the compare-and-swap token: a conditional write succeeds
/// only if the stored bytes still equal the expected prior serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockRecord {
    /// The scoped resource key this record guards.
    pub key: String,
    /// Sequencer of the last successful acquire. `None` before the first
    /// acquire commits, or again after a first-acquire rollback.
    pub sequencer: Option<Sequencer>,
    /// True while a processing callback is in flight.
    pub locked: bool,
    /// Execution id of the last writer.
    pub updated_by: String,
}

impl LockRecord {
    /// The record written by a successful acquire: locked, carrying the
    /// incoming sequencer.
    pub fn acquired(
        key: impl Into<String>,
        sequencer: Sequencer,
        execution_id: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            sequencer: Some(sequencer),
            locked: true,
            updated_by: execution_id.into(),
        }
    }

    /// The unlocked form of this record, keeping the committed sequencer.
    pub fn unlocked(&self, execution_id: impl Into<String>) -> Self {
        Self {
            key: self.key.clone(),
            sequencer: self.sequencer.clone(),
            locked: false,
            updated_by: execution_id.into(),
        }
    }

    /// The unlocked form with the sequencer rolled back to `prior`, so that a
    /// redelivery of the event whose processing failed can acquire again.
    pub fn rolled_back(
        &self,
        prior: Option<Sequencer>,
        execution_id: impl Into<String>,
    ) -> Self {
        Self {
            key: self.key.clone(),
            sequencer: prior,
            locked: false,
            updated_by: execution_id.into(),
        }
    }
}

/// Predicate constraining a conditional record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePredicate {
    /// No record may exist for the key yet (first-time creation).
    Absent,
    /// The stored record must still match this observed prior state exactly.
    Matches(LockRecord),
}

/// How the coordinator disposed of one offered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The lock was acquired, the callback ran, and the sequencer committed.
    Processed,
    /// The event must not be processed; no state was changed.
    Skipped(SkipReason),
}

/// Why an event was skipped. Skipping is expected behavior, not an error,
/// and a skipped event needs no redelivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The sequencer is not newer than the one already committed.
    Stale,
    /// A concurrent invocation holds the lock for an equal or newer
    /// sequencer.
    Contended,
}
