//! Nullable peer health check — returns a scripted unhealthy set.

use async_trait::async_trait;
use statemon_network::{NetworkError, PeerHealthCheck};
use statemon_types::{Endpoint, UnhealthyPeerSet, UserRecord};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct NullPeerHealthCheck {
    unhealthy: UnhealthyPeerSet,
    fail: bool,
    calls: AtomicUsize,
}

impl NullPeerHealthCheck {
    /// Every peer healthy.
    pub fn healthy() -> Self {
        Self::with_unhealthy(Vec::<Endpoint>::new())
    }

    pub fn with_unhealthy<I, E>(peers: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint>,
    {
        Self {
            unhealthy: peers.into_iter().map(Into::into).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A health check that errors on every call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::healthy()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerHealthCheck for NullPeerHealthCheck {
    async fn get_unhealthy_peers(
        &self,
        _users: &[UserRecord],
    ) -> Result<UnhealthyPeerSet, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NetworkError::HealthCheck("probe backend unavailable".into()));
        }
        Ok(self.unhealthy.clone())
    }
}
