//! Job payloads exchanged with the external job queue.
//!
//! Field names follow the queue's camelCase wire format. Sets become sorted
//! arrays at this boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::endpoint::Endpoint;
use crate::replica::ReplicaStateMap;
use crate::sync_metrics::SyncMetricsMap;
use crate::user::{UserId, UserRecord};

/// Queues the monitor enqueues work onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueueName {
    #[serde(rename = "state-monitoring-queue")]
    StateMonitoring,
}

impl QueueName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateMonitoring => "state-monitoring-queue",
        }
    }
}

/// Job types on the state monitoring queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobName {
    MonitorState,
    FindSyncRequests,
    FindReplicaSetUpdates,
}

impl JobName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MonitorState => "monitor-state",
            Self::FindSyncRequests => "find-sync-requests",
            Self::FindReplicaSetUpdates => "find-replica-set-updates",
        }
    }

    pub fn is_reconciliation(self) -> bool {
        matches!(self, Self::FindSyncRequests | Self::FindReplicaSetUpdates)
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `monitor-state` job. The cursor lives here and nowhere else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStateJobData {
    pub last_processed_user_id: UserId,
    pub discovery_node_endpoint: String,
}

/// Snapshot handed to the reconciliation jobs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationJobData {
    pub users: Vec<UserRecord>,
    pub unhealthy_peers: Vec<Endpoint>,
    pub replica_to_user_info_map: ReplicaStateMap,
    pub user_secondary_sync_metrics_map: SyncMetricsMap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobData {
    Reconciliation(ReconciliationJobData),
    MonitorState(MonitorStateJobData),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub job_name: JobName,
    pub job_data: JobData,
}

impl JobDescriptor {
    pub fn monitor_state(data: MonitorStateJobData) -> Self {
        Self {
            job_name: JobName::MonitorState,
            job_data: JobData::MonitorState(data),
        }
    }

    pub fn reconciliation(job_name: JobName, data: ReconciliationJobData) -> Self {
        Self {
            job_name,
            job_data: JobData::Reconciliation(data),
        }
    }

    pub fn as_monitor_state(&self) -> Option<&MonitorStateJobData> {
        match &self.job_data {
            JobData::MonitorState(data) if self.job_name == JobName::MonitorState => Some(data),
            _ => None,
        }
    }

    pub fn as_reconciliation(&self) -> Option<&ReconciliationJobData> {
        match &self.job_data {
            JobData::Reconciliation(data) => Some(data),
            JobData::MonitorState(_) => None,
        }
    }
}

/// Result of one monitoring cycle: jobs to enqueue, keyed by queue.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutput {
    pub jobs_to_enqueue: BTreeMap<QueueName, Vec<JobDescriptor>>,
}

impl JobOutput {
    pub fn jobs(&self, queue: QueueName) -> &[JobDescriptor] {
        self.jobs_to_enqueue
            .get(&queue)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn job_count(&self) -> usize {
        self.jobs_to_enqueue.values().map(Vec::len).sum()
    }

    /// The follow-up `monitor-state` job, if one was emitted.
    pub fn next_monitor_state(&self) -> Option<&MonitorStateJobData> {
        self.jobs_to_enqueue
            .values()
            .flatten()
            .find_map(JobDescriptor::as_monitor_state)
    }

    pub fn find(&self, name: JobName) -> Option<&JobDescriptor> {
        self.jobs_to_enqueue
            .values()
            .flatten()
            .find(|job| job.job_name == name)
    }
}
