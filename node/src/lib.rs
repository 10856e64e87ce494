//! Replica state monitor — the control loop every storage node runs.
//!
//! One `monitor-state` cycle:
//! - Pages the next batch of users this node serves
//! - Finds unhealthy peers among their replica sets
//! - Groups wallets by the peer that should host them
//! - Queries each peer's clocks concurrently, marking silent peers unhealthy
//! - Computes historical secondary sync success rates
//! - Emits two reconciliation jobs and the next `monitor-state` job
//!
//! Any stage failure skips the rest of the pipeline but never emission, so
//! the loop keeps itself alive.

pub mod batch;
pub mod config;
pub mod decision_tree;
pub mod error;
pub mod grouping;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod peer_health;
pub mod replica_state;
pub mod runner;
pub mod shutdown;
pub mod snapshot;
pub mod sync_metrics;
pub mod tracing_spans;

pub use batch::{fetch_batch, next_cursor};
pub use config::MonitorConfig;
pub use decision_tree::{DecisionTree, DecisionTreeEntry};
pub use error::{NodeError, Stage, StageCause, StageError, ValidationError};
pub use grouping::group_by_peer;
pub use jobs::emit_jobs;
pub use logging::{init_logging, LogFormat};
pub use metrics::MonitorMetrics;
pub use monitor::{validate_job, CycleResult, MonitorDeps, StateMonitor};
pub use peer_health::find_unhealthy_peers;
pub use replica_state::{fetch_replica_state, ReplicaStateReport};
pub use runner::{ChannelJobSink, JobSink, LoggingJobSink, MonitorLoop};
pub use shutdown::ShutdownController;
pub use snapshot::CycleSnapshot;
pub use sync_metrics::compute_sync_metrics;
