//! Records sync request outcomes into today's counters.

use std::sync::Arc;

use statemon_types::{Endpoint, Wallet};
use statemon_utils::{day_index, Clock};

use crate::outcome::{Outcome, OutcomeKey, SyncOutcomeStore, SyncType};

/// Counters older than this are pruned on write.
pub const OUTCOME_RETENTION_DAYS: u64 = 90;

/// Front end used by sync workers to report outcomes.
///
/// Recording never fails from the caller's point of view: store errors are
/// logged and swallowed so a broken counter cannot fail a sync.
pub struct SyncOutcomeRecorder {
    store: Arc<dyn SyncOutcomeStore>,
    clock: Arc<dyn Clock>,
}

impl SyncOutcomeRecorder {
    pub fn new(store: Arc<dyn SyncOutcomeStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn record_success(&self, secondary: &Endpoint, wallet: &Wallet, sync_type: SyncType) {
        self.record(secondary, wallet, sync_type, Outcome::Success);
    }

    pub fn record_failure(&self, secondary: &Endpoint, wallet: &Wallet, sync_type: SyncType) {
        self.record(secondary, wallet, sync_type, Outcome::Failure);
    }

    fn record(&self, secondary: &Endpoint, wallet: &Wallet, sync_type: SyncType, outcome: Outcome) {
        let today = day_index(self.clock.now_secs());
        let key = OutcomeKey {
            secondary: secondary.clone(),
            wallet: wallet.clone(),
            sync_type,
            day: today,
            outcome,
        };
        match self.store.increment(key) {
            Ok(count) => tracing::debug!(
                secondary = %secondary,
                wallet = %wallet,
                sync_type = %sync_type,
                ?outcome,
                count,
                "recorded sync request outcome"
            ),
            Err(e) => {
                tracing::error!(secondary = %secondary, wallet = %wallet, "failed to record sync outcome: {e}");
                return;
            }
        }

        let cutoff = today.saturating_sub(OUTCOME_RETENTION_DAYS);
        if let Err(e) = self.store.prune_before(cutoff) {
            tracing::warn!("failed to prune expired sync outcomes: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySyncOutcomeStore;
    use statemon_utils::SECS_PER_DAY;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedClock(AtomicU64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn records_into_todays_bucket() {
        let store = Arc::new(MemorySyncOutcomeStore::new());
        let clock = Arc::new(FixedClock(AtomicU64::new(3 * SECS_PER_DAY * 1000)));
        let recorder = SyncOutcomeRecorder::new(store.clone(), clock);
        recorder.record_failure(&"http://s1".into(), &"w1".into(), SyncType::Manual);

        let counts = store.outcome_counts(&["w1".into()]).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].key.day, 3);
        assert_eq!(counts[0].key.outcome, Outcome::Failure);
    }

    #[test]
    fn old_counters_expire_after_retention_window() {
        let store = Arc::new(MemorySyncOutcomeStore::new());
        let clock = Arc::new(FixedClock(AtomicU64::new(0)));
        let recorder = SyncOutcomeRecorder::new(store.clone(), clock.clone());
        recorder.record_success(&"http://s1".into(), &"w1".into(), SyncType::Recurring);

        clock
            .0
            .store((OUTCOME_RETENTION_DAYS + 1) * SECS_PER_DAY * 1000, Ordering::Relaxed);
        recorder.record_success(&"http://s1".into(), &"w1".into(), SyncType::Recurring);

        let counts = store.outcome_counts(&["w1".into()]).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].key.day, OUTCOME_RETENTION_DAYS + 1);
    }
}
