//! Storage for secondary sync request outcomes.
//!
//! The sync-metrics stage of the monitor reads daily success/failure counters
//! per (secondary, wallet) through the [`SyncOutcomeStore`] trait. The rest of
//! the codebase depends only on the trait; [`MemorySyncOutcomeStore`] is the
//! in-process backend used by the daemon.

pub mod error;
pub mod memory;
pub mod outcome;
pub mod recorder;

pub use error::StoreError;
pub use memory::MemorySyncOutcomeStore;
pub use outcome::{Outcome, OutcomeCount, OutcomeKey, SyncOutcomeStore, SyncType};
pub use recorder::{SyncOutcomeRecorder, OUTCOME_RETENTION_DAYS};
