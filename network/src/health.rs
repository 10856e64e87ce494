//! Peer health probing over each peer's `/health_check` route.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use statemon_types::{Endpoint, UnhealthyPeerSet, UserRecord};

use crate::traits::PeerHealthCheck;
use crate::NetworkError;

/// Default per-peer probe timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Every distinct replica node referenced by `users`, excluding `self_endpoint`.
pub fn collect_peers(users: &[UserRecord], self_endpoint: &Endpoint) -> BTreeSet<Endpoint> {
    users
        .iter()
        .filter_map(|u| u.replica_set.as_ref())
        .flat_map(|set| set.nodes())
        .filter(|node| *node != self_endpoint && !node.is_empty())
        .cloned()
        .collect()
}

/// [`PeerHealthCheck`] that probes every peer concurrently.
///
/// A peer is unhealthy when its probe times out, fails to connect or
/// answers with a non-success status.
pub struct HttpPeerHealthCheck {
    http_client: reqwest::Client,
    self_endpoint: Endpoint,
    probe_timeout: Duration,
}

impl HttpPeerHealthCheck {
    pub fn new(self_endpoint: Endpoint) -> Self {
        Self::with_timeout(self_endpoint, PROBE_TIMEOUT)
    }

    pub fn with_timeout(self_endpoint: Endpoint, probe_timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            self_endpoint,
            probe_timeout,
        }
    }

    async fn probe(&self, peer: &Endpoint) -> Result<(), NetworkError> {
        let url = peer.url("/health_check");
        let request = self.http_client.get(&url).send();
        let response = tokio::time::timeout(self.probe_timeout, request)
            .await
            .map_err(|_| NetworkError::Timeout {
                peer: peer.to_string(),
                after_ms: self.probe_timeout.as_millis() as u64,
            })?
            .map_err(|e| NetworkError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NetworkError::Status {
                url,
                status: response.status().as_u16(),
            })
        }
    }
}

#[async_trait]
impl PeerHealthCheck for HttpPeerHealthCheck {
    async fn get_unhealthy_peers(
        &self,
        users: &[UserRecord],
    ) -> Result<UnhealthyPeerSet, NetworkError> {
        let peers = collect_peers(users, &self.self_endpoint);
        let probes = peers.iter().map(|peer| async move {
            let result = self.probe(peer).await;
            (peer, result)
        });

        let mut unhealthy = UnhealthyPeerSet::new();
        for (peer, result) in join_all(probes).await {
            if let Err(e) = result {
                tracing::debug!(peer = %peer, "health probe failed: {e}");
                unhealthy.insert(peer.clone());
            }
        }
        Ok(unhealthy)
    }
}
