//! The `monitor-state` job processor.
//!
//! One invocation pages one batch of users, gathers peer health, replica
//! clocks and sync success rates for it, and always ends by emitting the
//! reconciliation jobs plus the next `monitor-state` job. A failing stage
//! skips the stages after it; it never prevents emission.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::Instrument;

use statemon_network::{PeerClockClient, PeerHealthCheck, UserDirectory};
use statemon_store::SyncOutcomeStore;
use statemon_types::{Endpoint, JobOutput, MonitorStateJobData};
use statemon_utils::{Clock, JobLogger};

use crate::batch::fetch_batch;
use crate::config::MonitorConfig;
use crate::decision_tree::{DecisionTree, DecisionTreeEntry};
use crate::error::{Stage, StageError, ValidationError};
use crate::grouping::group_by_peer;
use crate::jobs::emit_jobs;
use crate::peer_health::find_unhealthy_peers;
use crate::replica_state::fetch_replica_state;
use crate::snapshot::CycleSnapshot;
use crate::sync_metrics::compute_sync_metrics;
use crate::tracing_spans::{monitor_cycle_span, pipeline_stage_span};

/// External collaborators the monitor reads from.
#[derive(Clone)]
pub struct MonitorDeps {
    pub directory: Arc<dyn UserDirectory>,
    pub health: Arc<dyn PeerHealthCheck>,
    pub clocks: Arc<dyn PeerClockClient>,
    pub outcomes: Arc<dyn SyncOutcomeStore>,
    pub clock: Arc<dyn Clock>,
}

/// Outcome of one cycle. `output` always holds three jobs; `error` is the
/// stage that cut the cycle short, if any.
#[derive(Debug)]
pub struct CycleResult {
    pub output: JobOutput,
    pub snapshot: CycleSnapshot,
    pub error: Option<StageError>,
    pub decision_tree: Vec<DecisionTreeEntry>,
}

impl CycleResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// What survives a failed stage: the snapshot as it stood, and why it stopped.
struct StageFailure {
    snapshot: CycleSnapshot,
    error: StageError,
}

pub struct StateMonitor {
    deps: MonitorDeps,
    self_endpoint: Endpoint,
    users_per_job: usize,
    clock_fetch_timeout: Duration,
}

impl StateMonitor {
    pub fn new(deps: MonitorDeps, config: &MonitorConfig) -> Self {
        Self {
            deps,
            self_endpoint: config.self_endpoint(),
            users_per_job: config.users_per_job,
            clock_fetch_timeout: config.clock_fetch_timeout(),
        }
    }

    pub fn self_endpoint(&self) -> &Endpoint {
        &self.self_endpoint
    }

    /// Validate a raw job payload and run one cycle.
    ///
    /// Validation completes before any collaborator is touched; a rejected
    /// payload emits no jobs.
    pub async fn process_job(
        &self,
        logger: Option<&dyn JobLogger>,
        payload: &Value,
    ) -> Result<JobOutput, ValidationError> {
        let (logger, job) = validate_job(logger, payload)?;
        Ok(self.run_cycle(logger, &job).await.output)
    }

    /// Run one cycle for an already-validated job.
    pub async fn run_cycle(&self, logger: &dyn JobLogger, job: &MonitorStateJobData) -> CycleResult {
        let span = monitor_cycle_span(job.last_processed_user_id, &job.discovery_node_endpoint);
        async {
            let mut tree = DecisionTree::new(logger, self.deps.clock.as_ref());
            tree.record(
                "BEGIN monitor-state",
                json!({
                    "lastProcessedUserId": job.last_processed_user_id,
                    "discoveryNodeEndpoint": job.discovery_node_endpoint,
                    "usersPerJob": self.users_per_job,
                }),
            );

            let (snapshot, error) = match self.run_stages(&mut tree, job).await {
                Ok(snapshot) => (snapshot, None),
                Err(StageFailure { snapshot, error }) => {
                    logger.error(&format!("monitor-state cycle cut short: {error}"));
                    (snapshot, Some(error))
                }
            };

            tree.record(
                "END monitor-state",
                json!({
                    "usersLength": snapshot.users.len(),
                    "unhealthyPeersLength": snapshot.unhealthy_peers.len(),
                }),
            );
            let decision_tree = tree.flush();

            CycleResult {
                output: emit_jobs(&snapshot, &job.discovery_node_endpoint),
                snapshot,
                error,
                decision_tree,
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        tree: &mut DecisionTree<'_>,
        job: &MonitorStateJobData,
    ) -> Result<CycleSnapshot, StageFailure> {
        let cursor = job.last_processed_user_id;

        let users = fetch_batch(
            self.deps.directory.as_ref(),
            &self.self_endpoint,
            &job.discovery_node_endpoint,
            cursor,
            self.users_per_job,
        )
        .instrument(pipeline_stage_span(Stage::FetchBatch.as_str()))
        .await
        .map_err(|error| fail(tree, CycleSnapshot::placeholder(cursor), error))?;
        tree.record(
            format!("{} Success", Stage::FetchBatch),
            json!({ "usersLength": users.len() }),
        );
        let snapshot = CycleSnapshot::from_users(users);

        let unhealthy = match find_unhealthy_peers(self.deps.health.as_ref(), &snapshot.users)
            .instrument(pipeline_stage_span(Stage::PeerHealth.as_str()))
            .await
        {
            Ok(unhealthy) => unhealthy,
            Err(error) => return Err(fail(tree, snapshot, error)),
        };
        tree.record(
            format!("{} Success", Stage::PeerHealth),
            json!({
                "unhealthyPeerSetLength": unhealthy.len(),
                "unhealthyPeers": unhealthy,
            }),
        );
        let snapshot = snapshot.with_unhealthy_peers(unhealthy);

        let groups = group_by_peer(&snapshot.users);
        tree.record(
            "group_by_peer Success",
            json!({ "numReplicaSetNodes": groups.len() }),
        );

        let report = match fetch_replica_state(
            Arc::clone(&self.deps.clocks),
            &groups,
            self.clock_fetch_timeout,
        )
        .instrument(pipeline_stage_span(Stage::ReplicaState.as_str()))
        .await
        {
            Ok(report) => report,
            Err(error) => return Err(fail(tree, snapshot, error)),
        };
        tree.record(
            format!("{} Success", Stage::ReplicaState),
            json!({
                "numPeersAnswered": report.states.len(),
                "unansweredPeers": report.unhealthy,
            }),
        );
        let snapshot = snapshot
            .with_replica_states(report.states)
            .with_unhealthy_peers(report.unhealthy);

        let metrics = pipeline_stage_span(Stage::SyncMetrics.as_str())
            .in_scope(|| compute_sync_metrics(self.deps.outcomes.as_ref(), &snapshot.users));
        let metrics = match metrics {
            Ok(metrics) => metrics,
            Err(error) => return Err(fail(tree, snapshot, error)),
        };
        tree.record(
            format!("{} Success", Stage::SyncMetrics),
            json!({ "userSecondarySyncMetricsMapLength": metrics.len() }),
        );

        Ok(snapshot.with_sync_metrics(metrics))
    }
}

fn fail(tree: &mut DecisionTree<'_>, snapshot: CycleSnapshot, error: StageError) -> StageFailure {
    tree.record(
        format!("{} Error", error.stage),
        json!({ "error": error.cause.to_string() }),
    );
    StageFailure { snapshot, error }
}

/// Check a raw `monitor-state` payload and the presence of a logger.
pub fn validate_job<'a>(
    logger: Option<&'a dyn JobLogger>,
    payload: &Value,
) -> Result<(&'a dyn JobLogger, MonitorStateJobData), ValidationError> {
    let logger = logger.ok_or(ValidationError::MissingLogger)?;

    let cursor = payload.get("lastProcessedUserId");
    let last_processed_user_id = cursor.and_then(cursor_from_number).ok_or_else(|| {
        ValidationError::InvalidLastProcessedUserId {
            kind: json_kind(cursor),
            value: describe(cursor),
        }
    })?;

    let discovery = payload.get("discoveryNodeEndpoint");
    let discovery_node_endpoint = discovery
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::InvalidDiscoveryNodeEndpoint {
            kind: json_kind(discovery),
            value: describe(discovery),
        })?;

    Ok((
        logger,
        MonitorStateJobData {
            last_processed_user_id,
            discovery_node_endpoint,
        },
    ))
}

/// Any JSON number is a usable cursor: negatives clamp to 0 and fractions
/// truncate toward zero.
fn cursor_from_number(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    Some(n.as_u64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f as u64)))
}

fn json_kind(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "none".to_string(), Value::to_string)
}
