//! End-to-end handling of one notification.
//!
//! This is the piece a hosting platform (queue consumer, event-driven
//! function handler) calls once per delivered notification. The platform owns
//! redelivery: any error returned here means the notification was not
//! processed and should be offered again.

use std::sync::Arc;

use tracing::info;

use crate::api::KeyValueStore;
use crate::classifier::{classify, Classification, Notification, RejectReason};
use crate::coordination::{
    CoordinationError, CoordinatorConfig, LockCoordinator, ProcessOutcome, Processor, SkipReason,
};

/// Configuration for the notification handler.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// When false the coordinator is bypassed entirely and every eligible
    /// event invokes the callback unconditionally — the unprotected baseline
    /// the coordinator exists to prevent.
    pub coordination_enabled: bool,
    /// Acquire-loop settings, used when coordination is enabled.
    pub coordinator: CoordinatorConfig,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            coordination_enabled: true,
            coordinator: CoordinatorConfig::default(),
        }
    }
}

/// How one notification was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The callback ran and the sequencer committed.
    Processed,
    /// Stale or lost the race; safely ignored.
    Skipped(SkipReason),
    /// Category outside the ordering-eligible set.
    Ignored,
    /// Malformed notification; not retried.
    Rejected(RejectReason),
}

/// Classifies notifications and routes eligible ones through the coordinator.
pub struct NotificationHandler<S: KeyValueStore + ?Sized, P: Processor + ?Sized> {
    coordinator: LockCoordinator<S>,
    processor: Arc<P>,
    config: HandlerConfig,
}

impl<S, P> NotificationHandler<S, P>
where
    S: KeyValueStore + ?Sized,
    P: Processor + ?Sized,
{
    /// Create a handler over the given backend and callback.
    pub fn new(store: Arc<S>, processor: Arc<P>, config: HandlerConfig) -> Self {
        Self {
            coordinator: LockCoordinator::new(store, config.coordinator.clone()),
            processor,
            config,
        }
    }

    /// Handle one delivered notification.
    pub async fn handle(
        &self,
        notification: &Notification,
    ) -> Result<Disposition, CoordinationError> {
        let disposition = match classify(notification) {
            Classification::Ignored => Disposition::Ignored,
            Classification::Rejected(reason) => Disposition::Rejected(reason),
            Classification::Eligible { lock_key, sequencer } => {
                if self.config.coordination_enabled {
                    let outcome = self
                        .coordinator
                        .try_process(&lock_key, &sequencer, &*self.processor)
                        .await?;
                    match outcome {
                        ProcessOutcome::Processed => Disposition::Processed,
                        ProcessOutcome::Skipped(reason) => Disposition::Skipped(reason),
                    }
                } else {
                    self.processor.process(&lock_key).await.map_err(|source| {
                        CoordinationError::Processing {
                            key: lock_key.clone(),
                            source,
                        }
                    })?;
                    Disposition::Processed
                }
            }
        };
        info!(
            scope = %notification.scope,
            key = notification.key.as_deref().unwrap_or(""),
            ?disposition,
            "notification handled"
        );
        Ok(disposition)
    }
}
