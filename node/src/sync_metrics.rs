use std::collections::{BTreeMap, HashMap};

use statemon_store::{Outcome, SyncOutcomeStore};
use statemon_types::{Endpoint, SecondarySyncMetrics, SyncMetricsMap, UserId, UserRecord, Wallet};

use crate::error::{Stage, StageError};

/// Per user, the historical sync success rate of each current secondary.
///
/// Every secondary in a user's replica set gets an entry, starting from zero
/// counts. Outcomes recorded against nodes that are no longer secondaries of
/// the user are skipped.
pub fn compute_sync_metrics(
    store: &dyn SyncOutcomeStore,
    batch: &[UserRecord],
) -> Result<SyncMetricsMap, StageError> {
    let mut counts: HashMap<&Wallet, (UserId, BTreeMap<&Endpoint, (u64, u64)>)> = HashMap::new();
    for user in batch {
        let Some((wallet, replica_set)) = user.replica() else {
            continue;
        };
        if replica_set.secondaries.is_empty() {
            continue;
        }
        let secondaries = replica_set
            .secondaries
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s, (0, 0)))
            .collect();
        counts.insert(wallet, (user.user_id, secondaries));
    }
    if counts.is_empty() {
        return Ok(SyncMetricsMap::new());
    }

    let wallets: Vec<Wallet> = counts.keys().map(|w| (*w).clone()).collect();
    let outcomes = store
        .outcome_counts(&wallets)
        .map_err(|e| StageError::new(Stage::SyncMetrics, e))?;

    for entry in outcomes {
        let Some((_, secondaries)) = counts.get_mut(&entry.key.wallet) else {
            continue;
        };
        let Some((success, failure)) = secondaries.get_mut(&entry.key.secondary) else {
            continue;
        };
        match entry.key.outcome {
            Outcome::Success => *success += entry.count,
            Outcome::Failure => *failure += entry.count,
        }
    }

    Ok(counts
        .into_values()
        .map(|(user_id, secondaries)| {
            let metrics = secondaries
                .into_iter()
                .map(|(secondary, (s, f))| {
                    (secondary.clone(), SecondarySyncMetrics::from_counts(s, f))
                })
                .collect();
            (user_id, metrics)
        })
        .collect())
}
