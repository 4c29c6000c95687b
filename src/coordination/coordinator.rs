//! The lock coordinator.
//!
//! Decides whether an offered event is processed, serializes concurrent
//! attempts on the same key, and leaves durable state such that late or
//! duplicate notifications are safely ignored. Correctness is derived solely
//! from the atomicity of the backend's per-key conditional write; the
//! coordinator itself holds no state beyond configuration, so any number of
//! independent instances may race on the same keys.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{CasOutcome, KeyValueStore};
use crate::coordination::error::{AcquireExhaustedSnafu, CoordinationError};
use crate::coordination::store::LockRecordStore;
use crate::coordination::types::{
    LockRecord, ProcessOutcome, Sequencer, SkipReason, WritePredicate,
};

/// Configuration for the coordinator's acquire loop.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum attempts while racing for the lock before giving up.
    pub max_acquire_attempts: u32,
    /// Base backoff between attempts in milliseconds.
    pub backoff_base_ms: u64,
    /// Maximum backoff between attempts in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_acquire_attempts: 8,
            backoff_base_ms: 25,
            backoff_max_ms: 1_000,
        }
    }
}

/// Unit of work executed once exclusive access is confirmed.
///
/// The callback owns any I/O it performs against external storage. A failure
/// does not corrupt the lock state — the coordinator releases the lock and
/// rolls the sequencer back first — and is then propagated to the caller
/// unchanged, so the hosting platform can redeliver the notification.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Process the resource behind `key` with exclusive access.
    async fn process(&self, key: &str) -> anyhow::Result<()>;
}

/// Serializes processing per key over a conditional-write store.
pub struct LockCoordinator<S: KeyValueStore + ?Sized> {
    records: LockRecordStore<S>,
    config: CoordinatorConfig,
}

impl<S: KeyValueStore + ?Sized> LockCoordinator<S> {
    /// Create a coordinator over the given backend.
    pub fn new(store: Arc<S>, config: CoordinatorConfig) -> Self {
        Self {
            records: LockRecordStore::new(store),
            config,
        }
    }

    /// Offer one event for `key` carrying `sequencer`.
    ///
    /// Runs `processor` at most once, and only if `sequencer` is newer than
    /// everything committed for the key so far. Concurrent offers for the
    /// same key resolve to exactly one winner per acquire through the
    /// backend's conditional write; losers re-read and either retry or
    /// converge to [`ProcessOutcome::Skipped`].
    ///
    /// An error means the event was not processed and should be redelivered
    /// by the caller's platform.
    pub async fn try_process<P>(
        &self,
        key: &str,
        sequencer: &Sequencer,
        processor: &P,
    ) -> Result<ProcessOutcome, CoordinationError>
    where
        P: Processor + ?Sized,
    {
        let execution_id = Uuid::new_v4().to_string();
        let mut attempts: u32 = 0;
        let mut backoff_ms = self.config.backoff_base_ms;

        loop {
            let observed = self.records.read(key).await?;

            let (predicate, prior_sequencer) = match observed {
                None => (WritePredicate::Absent, None),
                Some(record) if record.locked => {
                    // Another invocation is processing this key right now.
                    // If it carries an equal or newer sequencer, this event is
                    // a concurrent duplicate and can be dropped; otherwise
                    // wait for the release and try again.
                    let superseded = record
                        .sequencer
                        .as_ref()
                        .is_some_and(|in_flight| sequencer.compare(in_flight) != Ordering::Greater);
                    if superseded {
                        debug!(
                            key = %key,
                            sequencer = %sequencer,
                            "lock held for an equal or newer sequencer, skipping"
                        );
                        return Ok(ProcessOutcome::Skipped(SkipReason::Contended));
                    }
                    attempts += 1;
                    if attempts >= self.config.max_acquire_attempts {
                        return AcquireExhaustedSnafu { key, attempts }.fail();
                    }
                    backoff_ms = self.backoff(key, attempts, backoff_ms).await;
                    continue;
                }
                Some(record) => {
                    if let Some(committed) = &record.sequencer {
                        if sequencer.compare(committed) != Ordering::Greater {
                            debug!(
                                key = %key,
                                sequencer = %sequencer,
                                committed = %committed,
                                "sequencer not newer than committed value, skipping"
                            );
                            return Ok(ProcessOutcome::Skipped(SkipReason::Stale));
                        }
                    }
                    let prior = record.sequencer.clone();
                    (WritePredicate::Matches(record), prior)
                }
            };

            let acquired = LockRecord::acquired(key, sequencer.clone(), &execution_id);
            match self.records.write(&predicate, &acquired).await? {
                CasOutcome::Committed => {
                    debug!(
                        key = %key,
                        sequencer = %sequencer,
                        execution_id = %execution_id,
                        "lock acquired"
                    );
                    return self
                        .run_and_release(acquired, prior_sequencer, &execution_id, processor)
                        .await;
                }
                CasOutcome::Conflict => {
                    // Lost the race; the record changed between read and
                    // write. Re-read and re-evaluate from scratch.
                    attempts += 1;
                    if attempts >= self.config.max_acquire_attempts {
                        return AcquireExhaustedSnafu { key, attempts }.fail();
                    }
                    backoff_ms = self.backoff(key, attempts, backoff_ms).await;
                }
            }
        }
    }

    /// Run the callback under the acquired lock, then release.
    ///
    /// Release happens regardless of the callback outcome. On failure the
    /// sequencer is rolled back to its pre-acquire value so that a
    /// redelivered retry of the same event can acquire again.
    async fn run_and_release<P>(
        &self,
        acquired: LockRecord,
        prior_sequencer: Option<Sequencer>,
        execution_id: &str,
        processor: &P,
    ) -> Result<ProcessOutcome, CoordinationError>
    where
        P: Processor + ?Sized,
    {
        let key = acquired.key.clone();
        match processor.process(&key).await {
            Ok(()) => {
                let released = acquired.unlocked(execution_id);
                self.release(&acquired, &released).await?;
                debug!(key = %key, "processed and released");
                Ok(ProcessOutcome::Processed)
            }
            Err(source) => {
                let rolled_back = acquired.rolled_back(prior_sequencer, execution_id);
                self.release(&acquired, &rolled_back).await?;
                debug!(key = %key, "released with rollback after callback failure");
                Err(CoordinationError::Processing { key, source })
            }
        }
    }

    /// Swap our own acquire record for `next` with a conditional write.
    ///
    /// A conflict here means the stored record is no longer the one this
    /// invocation wrote; the store owns the truth at that point, so the
    /// conflict is logged and not treated as a failure.
    async fn release(
        &self,
        acquired: &LockRecord,
        next: &LockRecord,
    ) -> Result<(), CoordinationError> {
        let predicate = WritePredicate::Matches(acquired.clone());
        match self.records.write(&predicate, next).await? {
            CasOutcome::Committed => Ok(()),
            CasOutcome::Conflict => {
                warn!(
                    key = %acquired.key,
                    "release lost its conditional write; record was modified by another writer"
                );
                Ok(())
            }
        }
    }

    /// Sleep with jitter and return the next backoff value.
    async fn backoff(&self, key: &str, attempt: u32, backoff_ms: u64) -> u64 {
        // Create the rng here to avoid holding a non-Send type across await.
        let jitter = rand::rng().random_range(0..backoff_ms / 2 + 1);
        let sleep_ms = backoff_ms + jitter;
        debug!(key = %key, attempt, backoff_ms = sleep_ms, "lost the race, backing off");
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        (backoff_ms * 2).min(self.config.backoff_max_ms)
    }
}
