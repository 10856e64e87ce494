//! Concurrent per-peer clock queries.
//!
//! Each peer gets one task covering every wallet it hosts. A peer that
//! errors, panics or misses its deadline is reported unhealthy and
//! contributes no entries; the other peers are unaffected.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tracing::Instrument;

use statemon_network::{PeerClockClient, WalletClock};
use statemon_types::{
    Endpoint, ReplicaGroupMap, ReplicaStateMap, ReplicaUserInfo, UnhealthyPeerSet, Wallet,
};

use crate::error::{Stage, StageError};
use crate::tracing_spans::peer_query_span;

/// Replica state gathered in one fan-out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplicaStateReport {
    pub states: ReplicaStateMap,
    /// Peers that failed to answer in time.
    pub unhealthy: UnhealthyPeerSet,
}

enum PeerOutcome {
    Answered(Vec<WalletClock>),
    Failed(String),
}

/// Query every peer in `groups` for the clocks of the wallets it hosts.
pub async fn fetch_replica_state(
    client: Arc<dyn PeerClockClient>,
    groups: &ReplicaGroupMap,
    per_peer_timeout: Duration,
) -> Result<ReplicaStateReport, StageError> {
    let mut tasks = JoinSet::new();
    for (peer, wallets) in groups {
        if wallets.is_empty() {
            continue;
        }
        let client = Arc::clone(&client);
        let peer = peer.clone();
        let wallets = wallets.clone();
        let span = peer_query_span(peer.as_str(), wallets.len());
        tasks.spawn(
            async move {
                let outcome = query_peer(client.as_ref(), &peer, &wallets, per_peer_timeout).await;
                (peer, wallets, outcome)
            }
            .instrument(span),
        );
    }

    let mut report = ReplicaStateReport::default();
    while let Some(joined) = tasks.join_next().await {
        let (peer, wallets, outcome) =
            joined.map_err(|e| StageError::new(Stage::ReplicaState, e))?;
        match outcome {
            PeerOutcome::Answered(clocks) => {
                let entries = retain_requested(&wallets, clocks);
                report.states.insert(peer, entries);
            }
            PeerOutcome::Failed(reason) => {
                tracing::warn!(peer = %peer, "clock status query failed: {reason}");
                report.unhealthy.insert(peer);
            }
        }
    }
    Ok(report)
}

async fn query_peer(
    client: &dyn PeerClockClient,
    peer: &Endpoint,
    wallets: &[Wallet],
    per_peer_timeout: Duration,
) -> PeerOutcome {
    let query = AssertUnwindSafe(client.batch_clock_status(peer, wallets)).catch_unwind();
    match tokio::time::timeout(per_peer_timeout, query).await {
        Ok(Ok(Ok(clocks))) => PeerOutcome::Answered(clocks),
        Ok(Ok(Err(e))) => PeerOutcome::Failed(e.to_string()),
        Ok(Err(_panic)) => PeerOutcome::Failed("query panicked".into()),
        Err(_) => PeerOutcome::Failed(format!(
            "no answer within {}ms",
            per_peer_timeout.as_millis()
        )),
    }
}

/// Keep only answers for wallets that were asked about; the last answer
/// for a wallet wins if a peer repeats it.
fn retain_requested(
    requested: &[Wallet],
    clocks: Vec<WalletClock>,
) -> std::collections::BTreeMap<Wallet, ReplicaUserInfo> {
    let requested: BTreeSet<&Wallet> = requested.iter().collect();
    clocks
        .into_iter()
        .filter(|c| requested.contains(&c.wallet))
        .map(|c| (c.wallet, ReplicaUserInfo::new(c.clock, c.files_hash)))
        .collect()
}
