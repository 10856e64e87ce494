//! Fundamental types for the replica state monitor.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! node endpoints, wallets, user records and replica sets, the per-cycle replica
//! and sync-metric maps, and the job payloads exchanged with the scheduler.

pub mod endpoint;
pub mod job;
pub mod replica;
pub mod sync_metrics;
pub mod user;

pub use endpoint::{Endpoint, Wallet};
pub use job::{
    JobData, JobDescriptor, JobName, JobOutput, MonitorStateJobData, QueueName,
    ReconciliationJobData,
};
pub use replica::{ReplicaGroupMap, ReplicaStateMap, ReplicaUserInfo, UnhealthyPeerSet};
pub use sync_metrics::{SecondarySyncMetrics, SyncMetricsMap};
pub use user::{ReplicaSet, UserId, UserRecord};
