//! Per-key coordination built on conditional writes.
//!
//! The coordinator serializes processing of change notifications per resource
//! key and suppresses stale or duplicate deliveries, using the backend's
//! compare-and-swap as the only synchronization primitive. See
//! [`LockCoordinator::try_process`] for the algorithm.

mod coordinator;
mod error;
mod store;
mod types;

pub use coordinator::CoordinatorConfig;
pub use coordinator::LockCoordinator;
pub use coordinator::Processor;
pub use error::CoordinationError;
pub use store::LockRecordStore;
pub use types::LockRecord;
pub use types::ProcessOutcome;
pub use types::Sequencer;
pub use types::SkipReason;
pub use types::WritePredicate;
