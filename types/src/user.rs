//! User records and replica sets as reported by the discovery node.

use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, Wallet};

/// Monotonic user identifier assigned by the discovery index.
pub type UserId = u64;

/// The nodes assigned to store one user's data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    pub primary: Endpoint,
    #[serde(default)]
    pub secondaries: Vec<Endpoint>,
}

impl ReplicaSet {
    pub fn new(primary: Endpoint, secondaries: Vec<Endpoint>) -> Self {
        Self {
            primary,
            secondaries,
        }
    }

    /// Primary first, then secondaries in assignment order.
    pub fn nodes(&self) -> impl Iterator<Item = &Endpoint> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.nodes().any(|n| n == endpoint)
    }
}

/// One user owned by this node, as returned for a single monitoring cycle.
///
/// A placeholder record carries only `user_id`. It is produced when the batch
/// fetch fails so the follow-up job resumes from the same cursor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<Wallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set: Option<ReplicaSet>,
}

impl UserRecord {
    pub fn new(user_id: UserId, wallet: Wallet, replica_set: ReplicaSet) -> Self {
        Self {
            user_id,
            wallet: Some(wallet),
            replica_set: Some(replica_set),
        }
    }

    /// Record anchored at `cursor` with no wallet or replica set.
    pub fn placeholder(cursor: UserId) -> Self {
        Self {
            user_id: cursor,
            wallet: None,
            replica_set: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.wallet.is_none() && self.replica_set.is_none()
    }

    /// Wallet and replica set, when both are known.
    pub fn replica(&self) -> Option<(&Wallet, &ReplicaSet)> {
        match (&self.wallet, &self.replica_set) {
            (Some(wallet), Some(set)) => Some((wallet, set)),
            _ => None,
        }
    }
}
