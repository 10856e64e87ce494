//! Nullable discovery node — serves a fixed user table.

use async_trait::async_trait;
use statemon_network::{NetworkError, UserDirectory};
use statemon_types::{Endpoint, UserId, UserRecord};
use std::sync::Mutex;

/// A user directory backed by an in-memory table.
///
/// Answers like a discovery node would (users after the cursor whose replica
/// set contains the caller, capped at the limit) unless scripted to fail.
pub struct NullUserDirectory {
    users: Vec<UserRecord>,
    fail: bool,
    raw: bool,
    calls: Mutex<Vec<(String, UserId, usize)>>,
}

impl NullUserDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            fail: false,
            raw: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A directory whose every call fails as if the discovery node were down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    /// Return the table exactly as given, ignoring cursor, limit and ownership.
    /// Lets tests hand the monitor unsorted or oversized answers.
    pub fn raw(users: Vec<UserRecord>) -> Self {
        Self {
            raw: true,
            ..Self::new(users)
        }
    }

    /// Every `(discovery, prev_user_id, max_users)` this directory was asked for.
    pub fn calls(&self) -> Vec<(String, UserId, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserDirectory for NullUserDirectory {
    async fn get_node_users(
        &self,
        discovery: &str,
        self_endpoint: &Endpoint,
        prev_user_id: UserId,
        max_users: usize,
    ) -> Result<Vec<UserRecord>, NetworkError> {
        self.calls
            .lock()
            .unwrap()
            .push((discovery.to_string(), prev_user_id, max_users));

        if self.fail {
            return Err(NetworkError::Request {
                url: discovery.to_string(),
                reason: "connection refused".into(),
            });
        }
        if self.raw {
            return Ok(self.users.clone());
        }

        let mut users: Vec<UserRecord> = self
            .users
            .iter()
            .filter(|u| u.user_id > prev_user_id)
            .filter(|u| {
                u.replica_set
                    .as_ref()
                    .is_some_and(|set| set.contains(self_endpoint))
            })
            .cloned()
            .collect();
        users.sort_by_key(|u| u.user_id);
        users.truncate(max_users);
        Ok(users)
    }
}
