use statemon_types::{ReplicaGroupMap, UserRecord};

/// Map every replica node in the batch to the wallets it should be serving.
///
/// A wallet is listed under each node of its replica set, primary and
/// secondaries alike. Records without a wallet or replica set contribute
/// nothing, and a node listed twice in one replica set gets the wallet once.
pub fn group_by_peer(batch: &[UserRecord]) -> ReplicaGroupMap {
    let mut groups = ReplicaGroupMap::new();
    for (wallet, replica_set) in batch.iter().filter_map(UserRecord::replica) {
        for node in replica_set.nodes().filter(|n| !n.is_empty()) {
            let wallets = groups.entry(node.clone()).or_default();
            if !wallets.contains(wallet) {
                wallets.push(wallet.clone());
            }
        }
    }
    groups
}
