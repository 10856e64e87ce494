//! Discovery node client: pages through the users this node serves.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statemon_types::{Endpoint, ReplicaSet, UserId, UserRecord, Wallet};

use crate::traits::UserDirectory;
use crate::NetworkError;

/// Default timeout for a discovery query.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct NodeUsersResponse {
    data: Vec<DiscoveryUser>,
}

/// User row as the discovery node reports it. Secondaries may be null or
/// empty for users that have not yet been assigned a full replica set.
/// Wallet and primary should always be set; rows missing either are kept
/// id-only.
#[derive(Debug, Deserialize)]
struct DiscoveryUser {
    user_id: UserId,
    wallet: Option<String>,
    primary: Option<String>,
    secondary1: Option<String>,
    secondary2: Option<String>,
}

impl DiscoveryUser {
    /// A row without a wallet or primary keeps only its id, so the batch's
    /// highest id still moves the cursor past it.
    fn into_record(self) -> UserRecord {
        let wallet = self.wallet.filter(|w| !w.is_empty());
        let primary = self.primary.map(Endpoint::new).filter(|e| !e.is_empty());
        let (Some(wallet), Some(primary)) = (wallet, primary) else {
            tracing::warn!(user_id = self.user_id, "discovery row lacks wallet or primary, skipping");
            return UserRecord::placeholder(self.user_id);
        };
        let secondaries = [self.secondary1, self.secondary2]
            .into_iter()
            .flatten()
            .map(Endpoint::new)
            .filter(|e| !e.is_empty())
            .collect();
        UserRecord::new(
            self.user_id,
            Wallet::new(wallet),
            ReplicaSet::new(primary, secondaries),
        )
    }
}

/// [`UserDirectory`] backed by a discovery node's HTTP API.
pub struct HttpUserDirectory {
    http_client: reqwest::Client,
}

impl HttpUserDirectory {
    pub fn new() -> Self {
        Self::with_timeout(DISCOVERY_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discovery client builder failed, using defaults without timeout");
                reqwest::Client::new()
            });
        Self { http_client }
    }
}

impl Default for HttpUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_node_users(
        &self,
        discovery: &str,
        self_endpoint: &Endpoint,
        prev_user_id: UserId,
        max_users: usize,
    ) -> Result<Vec<UserRecord>, NetworkError> {
        let url = Endpoint::new(discovery).url("/users/content_node");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("creator_node_endpoint", self_endpoint.as_str().to_string()),
                ("prev_user_id", prev_user_id.to_string()),
                ("max_users", max_users.to_string()),
            ])
            .send()
            .await
            .map_err(|e| NetworkError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(NetworkError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body: NodeUsersResponse =
            response
                .json()
                .await
                .map_err(|e| NetworkError::InvalidResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

        Ok(body.data.into_iter().map(DiscoveryUser::into_record).collect())
    }
}
