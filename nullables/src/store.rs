//! Nullable outcome store that always fails.

use statemon_store::{OutcomeCount, OutcomeKey, StoreError, SyncOutcomeStore};
use statemon_types::Wallet;

/// Outcome store whose backend is permanently unavailable.
///
/// Pair with `statemon_store::MemorySyncOutcomeStore` for the happy path.
#[derive(Default)]
pub struct FailingOutcomeStore;

impl SyncOutcomeStore for FailingOutcomeStore {
    fn increment(&self, _key: OutcomeKey) -> Result<u64, StoreError> {
        Err(StoreError::Backend("outcome store offline".into()))
    }

    fn outcome_counts(&self, _wallets: &[Wallet]) -> Result<Vec<OutcomeCount>, StoreError> {
        Err(StoreError::Backend("outcome store offline".into()))
    }

    fn prune_before(&self, _day: u64) -> Result<usize, StoreError> {
        Err(StoreError::Backend("outcome store offline".into()))
    }
}
