//! Sync outcome keys and the storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use statemon_types::{Endpoint, Wallet};
use std::fmt;

/// Result of one sync request from a primary to a secondary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

/// Why the sync request was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncType {
    Recurring,
    Manual,
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recurring => f.write_str("Recurring"),
            Self::Manual => f.write_str("Manual"),
        }
    }
}

/// Identity of one daily counter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutcomeKey {
    pub secondary: Endpoint,
    pub wallet: Wallet,
    pub sync_type: SyncType,
    /// Days since the Unix epoch (UTC).
    pub day: u64,
    pub outcome: Outcome,
}

/// A daily counter and its current value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomeCount {
    pub key: OutcomeKey,
    pub count: u64,
}

/// Trait for secondary sync outcome storage.
pub trait SyncOutcomeStore: Send + Sync {
    /// Increment the counter for `key`, creating it at zero if absent.
    fn increment(&self, key: OutcomeKey) -> Result<u64, StoreError>;

    /// All counters whose wallet is one of `wallets`, across every day retained.
    fn outcome_counts(&self, wallets: &[Wallet]) -> Result<Vec<OutcomeCount>, StoreError>;

    /// Drop every counter for a day strictly before `day`. Returns the number removed.
    fn prune_before(&self, day: u64) -> Result<usize, StoreError>;

    /// Failure count for one (secondary, wallet, sync type) on one day.
    fn failure_count_for_day(
        &self,
        secondary: &Endpoint,
        wallet: &Wallet,
        sync_type: SyncType,
        day: u64,
    ) -> Result<u64, StoreError> {
        let counts = self.outcome_counts(std::slice::from_ref(wallet))?;
        Ok(counts
            .into_iter()
            .find(|c| {
                c.key.outcome == Outcome::Failure
                    && c.key.day == day
                    && c.key.sync_type == sync_type
                    && &c.key.secondary == secondary
            })
            .map(|c| c.count)
            .unwrap_or(0))
    }
}
