//! In-memory outcome store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use statemon_types::Wallet;

use crate::outcome::{OutcomeCount, OutcomeKey, SyncOutcomeStore};
use crate::StoreError;

/// Thread-safe in-process counter map.
///
/// Counters live only as long as the process; a restarted node starts with
/// every secondary at a success rate of 1.
#[derive(Default)]
pub struct MemorySyncOutcomeStore {
    counters: Mutex<HashMap<OutcomeKey, u64>>,
}

impl MemorySyncOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.counters.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SyncOutcomeStore for MemorySyncOutcomeStore {
    fn increment(&self, key: OutcomeKey) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::Poisoned)?;
        let count = counters.entry(key).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn outcome_counts(&self, wallets: &[Wallet]) -> Result<Vec<OutcomeCount>, StoreError> {
        if wallets.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&Wallet> = wallets.iter().collect();
        let counters = self.counters.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(counters
            .iter()
            .filter(|(key, _)| wanted.contains(&key.wallet))
            .map(|(key, count)| OutcomeCount {
                key: key.clone(),
                count: *count,
            })
            .collect())
    }

    fn prune_before(&self, day: u64) -> Result<usize, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::Poisoned)?;
        let before = counters.len();
        counters.retain(|key, _| key.day >= day);
        Ok(before - counters.len())
    }
}
