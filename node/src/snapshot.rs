//! Per-cycle snapshot, built up one stage at a time.
//!
//! Each stage consumes the snapshot and returns a new one with its own
//! contribution merged in. Whatever was merged before a failing stage is
//! what gets emitted.

use statemon_types::{
    Endpoint, ReconciliationJobData, ReplicaStateMap, SyncMetricsMap, UnhealthyPeerSet, UserId,
    UserRecord,
};

use crate::batch::next_cursor;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CycleSnapshot {
    pub users: Vec<UserRecord>,
    pub unhealthy_peers: UnhealthyPeerSet,
    pub replica_states: ReplicaStateMap,
    pub sync_metrics: SyncMetricsMap,
}

impl CycleSnapshot {
    pub fn from_users(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    /// Snapshot for a cycle whose batch could not be fetched. Carries a single
    /// id-only record so the next cycle restarts at `cursor`.
    pub fn placeholder(cursor: UserId) -> Self {
        Self::from_users(vec![UserRecord::placeholder(cursor)])
    }

    /// Union `peers` into the unhealthy set. Peers are never removed.
    pub fn with_unhealthy_peers(mut self, peers: UnhealthyPeerSet) -> Self {
        self.unhealthy_peers.extend(peers);
        self
    }

    /// Merge per-peer states; a peer's entries are combined wallet by wallet.
    pub fn with_replica_states(mut self, states: ReplicaStateMap) -> Self {
        for (peer, wallets) in states {
            self.replica_states.entry(peer).or_default().extend(wallets);
        }
        self
    }

    pub fn with_sync_metrics(mut self, metrics: SyncMetricsMap) -> Self {
        self.sync_metrics.extend(metrics);
        self
    }

    pub fn next_cursor(&self) -> UserId {
        next_cursor(&self.users)
    }

    /// Payload for the reconciliation jobs. The unhealthy set becomes a
    /// sorted array of distinct endpoints.
    pub fn to_job_data(&self) -> ReconciliationJobData {
        ReconciliationJobData {
            users: self.users.clone(),
            unhealthy_peers: self.unhealthy_peers.iter().cloned().collect::<Vec<Endpoint>>(),
            replica_to_user_info_map: self.replica_states.clone(),
            user_secondary_sync_metrics_map: self.sync_metrics.clone(),
        }
    }
}
