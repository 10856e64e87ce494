use std::collections::BTreeMap;

use statemon_types::{JobDescriptor, JobName, JobOutput, MonitorStateJobData, QueueName};

use crate::snapshot::CycleSnapshot;

/// Package a snapshot into the cycle's three jobs: both reconciliation jobs
/// with the same payload, then the follow-up `monitor-state` job that
/// carries the cursor forward.
pub fn emit_jobs(snapshot: &CycleSnapshot, discovery_node_endpoint: &str) -> JobOutput {
    let data = snapshot.to_job_data();
    let jobs = vec![
        JobDescriptor::reconciliation(JobName::FindSyncRequests, data.clone()),
        JobDescriptor::reconciliation(JobName::FindReplicaSetUpdates, data),
        JobDescriptor::monitor_state(MonitorStateJobData {
            last_processed_user_id: snapshot.next_cursor(),
            discovery_node_endpoint: discovery_node_endpoint.to_string(),
        }),
    ];
    JobOutput {
        jobs_to_enqueue: BTreeMap::from([(QueueName::StateMonitoring, jobs)]),
    }
}
