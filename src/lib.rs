//! Stale-event suppression and per-key mutual exclusion for change
//! notifications, over any key-value store with atomic conditional writes.
//!
//! Change notifications about a named resource arrive at least once, in no
//! particular order, possibly duplicated, possibly concurrently. Each
//! eligible notification carries an opaque sequencer token that orders it
//! against other notifications for the same key. This crate decides which
//! notifications to process, serializes concurrent processing per key, and
//! leaves durable state such that late or duplicate deliveries are safely
//! ignored — using per-key compare-and-swap as the only synchronization
//! primitive. There is no consensus protocol and no reliance on transport
//! ordering.
//!
//! Whichever notification carries the greatest sequencer sets the final
//! committed state for its key, regardless of arrival order or race outcome;
//! the losers converge to a skipped disposition. Records are never deleted,
//! so a late create can never outrun a recorded delete.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use weir::{
//!     DeterministicKeyValueStore, HandlerConfig, Notification, NotificationHandler, Processor,
//! };
//!
//! struct Invert;
//!
//! #[async_trait::async_trait]
//! impl Processor for Invert {
//!     async fn process(&self, key: &str) -> anyhow::Result<()> {
//!         // read, transform, and write back the resource behind `key`
//!         Ok(())
//!     }
//! }
//!
//! # async fn run(notification: Notification) -> anyhow::Result<()> {
//! let store = DeterministicKeyValueStore::new();
//! let handler = NotificationHandler::new(store, Arc::new(Invert), HandlerConfig::default());
//! let disposition = handler.handle(&notification).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Known liveness gap, by design: a caller that crashes between acquire and
//! release leaves its record locked until an operator intervenes. There is no
//! lock expiry, because a false expiry would let two callers both believe
//! they hold exclusivity.

pub mod api;
pub mod classifier;
pub mod coordination;
pub mod handler;

pub use api::CasOutcome;
pub use api::DeterministicKeyValueStore;
pub use api::KeyValueStore;
pub use api::KeyValueStoreError;
pub use classifier::classify;
pub use classifier::Classification;
pub use classifier::EventCategory;
pub use classifier::Notification;
pub use classifier::RejectReason;
pub use coordination::CoordinationError;
pub use coordination::CoordinatorConfig;
pub use coordination::LockCoordinator;
pub use coordination::LockRecord;
pub use coordination::LockRecordStore;
pub use coordination::ProcessOutcome;
pub use coordination::Processor;
pub use coordination::Sequencer;
pub use coordination::SkipReason;
pub use coordination::WritePredicate;
pub use handler::Disposition;
pub use handler::HandlerConfig;
pub use handler::NotificationHandler;
