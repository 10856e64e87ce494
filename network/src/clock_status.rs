//! Batch clock status queries against a peer's `/users/batch_clock_status` route.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statemon_types::{Endpoint, Wallet};

use crate::traits::{PeerClockClient, WalletClock};
use crate::NetworkError;

/// Wallets per request unless configured otherwise.
pub const DEFAULT_MAX_CLOCK_FETCH_BATCH_SIZE: usize = 5000;

/// Transport-level ceiling; the monitor applies its own per-peer deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchClockStatusRequest<'a> {
    wallet_public_keys: &'a [Wallet],
}

#[derive(Deserialize)]
struct BatchClockStatusResponse {
    data: BatchClockStatusData,
}

#[derive(Deserialize)]
struct BatchClockStatusData {
    users: Vec<WalletClock>,
}

/// [`PeerClockClient`] over HTTP.
///
/// Large wallet lists are split into requests of at most `max_batch_size`
/// wallets, issued one after another; the first failing request fails the
/// whole query.
pub struct HttpPeerClockClient {
    http_client: reqwest::Client,
    max_batch_size: usize,
}

impl HttpPeerClockClient {
    pub fn new(max_batch_size: usize) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "clock client builder failed, using defaults without timeout");
                reqwest::Client::new()
            });
        Self {
            http_client,
            max_batch_size: max_batch_size.max(1),
        }
    }

    async fn fetch_chunk(
        &self,
        url: &str,
        wallets: &[Wallet],
    ) -> Result<Vec<WalletClock>, NetworkError> {
        let response = self
            .http_client
            .post(url)
            .query(&[("returnFilesHash", "true")])
            .json(&BatchClockStatusRequest {
                wallet_public_keys: wallets,
            })
            .send()
            .await
            .map_err(|e| NetworkError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: BatchClockStatusResponse =
            response
                .json()
                .await
                .map_err(|e| NetworkError::InvalidResponse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        Ok(body.data.users)
    }
}

impl Default for HttpPeerClockClient {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLOCK_FETCH_BATCH_SIZE)
    }
}

#[async_trait]
impl PeerClockClient for HttpPeerClockClient {
    async fn batch_clock_status(
        &self,
        peer: &Endpoint,
        wallets: &[Wallet],
    ) -> Result<Vec<WalletClock>, NetworkError> {
        let url = peer.url("/users/batch_clock_status");
        let mut clocks = Vec::with_capacity(wallets.len());
        for chunk in wallets.chunks(self.max_batch_size) {
            clocks.extend(self.fetch_chunk(&url, chunk).await?);
        }
        Ok(clocks)
    }
}
