//! Per-cycle maps describing which peers host which wallets and what they report.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::endpoint::{Endpoint, Wallet};

/// Peers considered unreachable during the current cycle.
///
/// Ordered so that the serialized array is stable across runs.
pub type UnhealthyPeerSet = BTreeSet<Endpoint>;

/// Peer endpoint → wallets that peer is expected to host.
pub type ReplicaGroupMap = BTreeMap<Endpoint, Vec<Wallet>>;

/// Peer endpoint → wallet → state reported by that peer.
///
/// Peers that failed to answer are absent, never zero-filled.
pub type ReplicaStateMap = BTreeMap<Endpoint, BTreeMap<Wallet, ReplicaUserInfo>>;

/// Replication state one peer reports for one wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaUserInfo {
    /// Per-user monotonic clock; `-1` when the peer has no record of the user.
    pub clock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_hash: Option<String>,
}

impl ReplicaUserInfo {
    pub const UNKNOWN_CLOCK: i64 = -1;

    pub fn new(clock: i64, files_hash: Option<String>) -> Self {
        Self { clock, files_hash }
    }

    /// Whether the peer has any data for this wallet.
    pub fn is_known(&self) -> bool {
        self.clock != Self::UNKNOWN_CLOCK
    }
}
