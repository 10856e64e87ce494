//! Nullable peer clock client — scripted per-peer answers.

use async_trait::async_trait;
use statemon_network::{NetworkError, PeerClockClient, WalletClock};
use statemon_types::{Endpoint, Wallet};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// How one scripted peer responds to a clock query.
#[derive(Clone, Debug)]
pub enum PeerBehavior {
    /// Report this clock value for every requested wallet.
    Clock(i64),
    /// Report exactly these entries regardless of the request.
    Entries(Vec<WalletClock>),
    /// Return an error.
    Fail,
    /// Sleep before answering with clock 0; exercises caller timeouts.
    Delay(Duration),
    /// Panic inside the query.
    Panic,
    /// Sleep like `Delay`, but panic if the query is dropped before it
    /// answers. A caller timeout then kills the whole task rather than one
    /// query.
    PanicOnCancel(Duration),
}

/// Panics when dropped unless disarmed with `mem::forget`.
struct PanicOnDrop(Endpoint);

impl Drop for PanicOnDrop {
    fn drop(&mut self) {
        panic!("clock query to {} cancelled mid-flight", self.0);
    }
}

/// A clock client that never touches the network.
///
/// Peers without a scripted behavior report clock 0 for every wallet.
pub struct NullPeerClockClient {
    behaviors: HashMap<Endpoint, PeerBehavior>,
    queries: Mutex<Vec<(Endpoint, Vec<Wallet>)>>,
}

impl NullPeerClockClient {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_peer(mut self, peer: impl Into<Endpoint>, behavior: PeerBehavior) -> Self {
        self.behaviors.insert(peer.into(), behavior);
        self
    }

    /// Every `(peer, wallets)` query received, in arrival order.
    pub fn queries(&self) -> Vec<(Endpoint, Vec<Wallet>)> {
        self.queries.lock().unwrap().clone()
    }

    fn answer(wallets: &[Wallet], clock: i64) -> Vec<WalletClock> {
        wallets
            .iter()
            .map(|w| WalletClock {
                wallet: w.clone(),
                clock,
                files_hash: None,
            })
            .collect()
    }
}

impl Default for NullPeerClockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerClockClient for NullPeerClockClient {
    async fn batch_clock_status(
        &self,
        peer: &Endpoint,
        wallets: &[Wallet],
    ) -> Result<Vec<WalletClock>, NetworkError> {
        self.queries
            .lock()
            .unwrap()
            .push((peer.clone(), wallets.to_vec()));

        match self.behaviors.get(peer).cloned() {
            None => Ok(Self::answer(wallets, 0)),
            Some(PeerBehavior::Clock(clock)) => Ok(Self::answer(wallets, clock)),
            Some(PeerBehavior::Entries(entries)) => Ok(entries),
            Some(PeerBehavior::Fail) => Err(NetworkError::Request {
                url: peer.url("/users/batch_clock_status"),
                reason: "connection reset".into(),
            }),
            Some(PeerBehavior::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Self::answer(wallets, 0))
            }
            Some(PeerBehavior::Panic) => panic!("scripted panic querying {peer}"),
            Some(PeerBehavior::PanicOnCancel(delay)) => {
                let guard = PanicOnDrop(peer.clone());
                tokio::time::sleep(delay).await;
                std::mem::forget(guard);
                Ok(Self::answer(wallets, 0))
            }
        }
    }
}
