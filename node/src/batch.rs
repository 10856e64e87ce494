//! Cursor-driven paging over the users this node serves.

use statemon_network::UserDirectory;
use statemon_types::{Endpoint, UserId, UserRecord};

use crate::error::{Stage, StageError};

/// Fetch the next batch of users after `cursor`, ascending by `user_id`.
///
/// The directory's answer is normalised: sorted, one record per user id and
/// at most `limit` records, so the last record always carries the batch's
/// highest id.
pub async fn fetch_batch(
    directory: &dyn UserDirectory,
    self_endpoint: &Endpoint,
    discovery: &str,
    cursor: UserId,
    limit: usize,
) -> Result<Vec<UserRecord>, StageError> {
    let mut users = directory
        .get_node_users(discovery, self_endpoint, cursor, limit)
        .await
        .map_err(|e| StageError::new(Stage::FetchBatch, e))?;

    users.sort_by_key(|u| u.user_id);
    users.dedup_by_key(|u| u.user_id);
    users.truncate(limit);
    Ok(users)
}

/// Cursor to hand to the next cycle: the highest id in the batch, or 0 to
/// wrap around once the user space is exhausted.
pub fn next_cursor(batch: &[UserRecord]) -> UserId {
    batch.iter().map(|u| u.user_id).max().unwrap_or(0)
}
