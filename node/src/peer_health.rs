use statemon_network::PeerHealthCheck;
use statemon_types::{UnhealthyPeerSet, UserRecord};

use crate::error::{Stage, StageError};

/// Peers in the batch's replica sets currently considered unreachable.
pub async fn find_unhealthy_peers(
    health: &dyn PeerHealthCheck,
    batch: &[UserRecord],
) -> Result<UnhealthyPeerSet, StageError> {
    health
        .get_unhealthy_peers(batch)
        .await
        .map_err(|e| StageError::new(Stage::PeerHealth, e))
}
