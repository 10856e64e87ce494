//! Historical secondary-sync success rates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::endpoint::Endpoint;
use crate::user::UserId;

/// User → secondary endpoint → aggregated sync outcomes.
pub type SyncMetricsMap = BTreeMap<UserId, BTreeMap<Endpoint, SecondarySyncMetrics>>;

/// Sync request outcomes from one primary to one secondary for one user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondarySyncMetrics {
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
}

impl SecondarySyncMetrics {
    /// Build metrics from raw counts. A secondary with no failures has rate 1.
    pub fn from_counts(success_count: u64, failure_count: u64) -> Self {
        let success_rate = if failure_count == 0 {
            1.0
        } else {
            success_count as f64 / (success_count + failure_count) as f64
        };
        Self {
            success_count,
            failure_count,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_failures_means_full_rate() {
        assert_eq!(SecondarySyncMetrics::from_counts(0, 0).success_rate, 1.0);
        assert_eq!(SecondarySyncMetrics::from_counts(12, 0).success_rate, 1.0);
    }

    #[test]
    fn rate_is_success_over_total() {
        let m = SecondarySyncMetrics::from_counts(3, 1);
        assert_eq!(m.success_rate, 0.75);
        assert_eq!(SecondarySyncMetrics::from_counts(0, 4).success_rate, 0.0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SecondarySyncMetrics::from_counts(1, 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "successCount": 1, "failureCount": 1, "successRate": 0.5 })
        );
    }
}
