use std::fmt;

use statemon_network::NetworkError;
use statemon_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("job sink error: {0}")]
    JobSink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected `monitor-state` job payload. Raised before any side effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing logger")]
    MissingLogger,

    #[error("invalid type (\"{kind}\") or value ({value}) of lastProcessedUserId")]
    InvalidLastProcessedUserId { kind: &'static str, value: String },

    #[error("invalid type (\"{kind}\") or value ({value}) of discoveryNodeEndpoint")]
    InvalidDiscoveryNodeEndpoint { kind: &'static str, value: String },
}

/// Pipeline stages that can fail independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    FetchBatch,
    PeerHealth,
    ReplicaState,
    SyncMetrics,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::FetchBatch,
        Stage::PeerHealth,
        Stage::ReplicaState,
        Stage::SyncMetrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchBatch => "fetch_batch",
            Self::PeerHealth => "peer_health",
            Self::ReplicaState => "replica_state",
            Self::SyncMetrics => "sync_metrics",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason a stage failed.
#[derive(Debug, Error)]
pub enum StageCause {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("peer query task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A pipeline stage failure with its original cause preserved.
#[derive(Debug, Error)]
#[error("{stage} failed: {cause}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub cause: StageCause,
}

impl StageError {
    pub fn new(stage: Stage, cause: impl Into<StageCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}
