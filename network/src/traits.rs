//! Collaborator traits consumed by the monitoring pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statemon_types::{Endpoint, UnhealthyPeerSet, UserId, UserRecord, Wallet};

use crate::NetworkError;

/// Source of the users whose replica set includes this node.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Up to `max_users` users with `user_id > prev_user_id` whose replica set
    /// contains `self_endpoint`, as known by the discovery node at `discovery`.
    async fn get_node_users(
        &self,
        discovery: &str,
        self_endpoint: &Endpoint,
        prev_user_id: UserId,
        max_users: usize,
    ) -> Result<Vec<UserRecord>, NetworkError>;
}

/// Decides which peers in a batch's replica sets are currently unhealthy.
#[async_trait]
pub trait PeerHealthCheck: Send + Sync {
    async fn get_unhealthy_peers(
        &self,
        users: &[UserRecord],
    ) -> Result<UnhealthyPeerSet, NetworkError>;
}

/// Clock value one peer reports for one wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletClock {
    #[serde(rename = "walletPublicKey")]
    pub wallet: Wallet,
    pub clock: i64,
    #[serde(default)]
    pub files_hash: Option<String>,
}

/// Queries one peer for the replication state of many wallets at once.
#[async_trait]
pub trait PeerClockClient: Send + Sync {
    async fn batch_clock_status(
        &self,
        peer: &Endpoint,
        wallets: &[Wallet],
    ) -> Result<Vec<WalletClock>, NetworkError>;
}
