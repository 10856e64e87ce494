//! End-to-end tests of the monitoring cycle with nullable collaborators:
//! directory → peer health → grouping → replica clocks → sync metrics → jobs.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use statemon_node::{
    ChannelJobSink, MonitorConfig, MonitorDeps, MonitorLoop, ShutdownController, Stage,
    StateMonitor, ValidationError,
};
use statemon_nullables::{
    FailingOutcomeStore, NullClock, NullPeerClockClient, NullPeerHealthCheck, NullUserDirectory,
    PeerBehavior, RecordingLogger,
};
use statemon_store::{MemorySyncOutcomeStore, Outcome, OutcomeKey, SyncOutcomeStore, SyncType};
use statemon_types::{
    Endpoint, JobName, MonitorStateJobData, QueueName, ReplicaSet, UserRecord, Wallet,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SELF: &str = "http://self";
const DISCOVERY: &str = "http://discovery";

fn user(id: u64, secondaries: &[&str]) -> UserRecord {
    UserRecord::new(
        id,
        Wallet::new(format!("0x{id}")),
        ReplicaSet::new(
            SELF.into(),
            secondaries.iter().map(|s| Endpoint::new(*s)).collect(),
        ),
    )
}

fn config(users_per_job: usize) -> MonitorConfig {
    MonitorConfig {
        self_endpoint: SELF.into(),
        discovery_node_endpoint: DISCOVERY.into(),
        users_per_job,
        clock_fetch_timeout_ms: 200,
        ..Default::default()
    }
}

struct Harness {
    directory: Arc<NullUserDirectory>,
    health: Arc<NullPeerHealthCheck>,
    clocks: Arc<NullPeerClockClient>,
    outcomes: Arc<dyn SyncOutcomeStore>,
    users_per_job: usize,
}

impl Harness {
    fn new(users: Vec<UserRecord>) -> Self {
        Self {
            directory: Arc::new(NullUserDirectory::new(users)),
            health: Arc::new(NullPeerHealthCheck::healthy()),
            clocks: Arc::new(NullPeerClockClient::new()),
            outcomes: Arc::new(MemorySyncOutcomeStore::new()),
            users_per_job: 100,
        }
    }

    fn directory(mut self, directory: NullUserDirectory) -> Self {
        self.directory = Arc::new(directory);
        self
    }

    fn health(mut self, health: NullPeerHealthCheck) -> Self {
        self.health = Arc::new(health);
        self
    }

    fn clocks(mut self, clocks: NullPeerClockClient) -> Self {
        self.clocks = Arc::new(clocks);
        self
    }

    fn outcomes(mut self, outcomes: Arc<dyn SyncOutcomeStore>) -> Self {
        self.outcomes = outcomes;
        self
    }

    fn users_per_job(mut self, n: usize) -> Self {
        self.users_per_job = n;
        self
    }

    fn monitor(&self) -> StateMonitor {
        let deps = MonitorDeps {
            directory: self.directory.clone(),
            health: self.health.clone(),
            clocks: self.clocks.clone(),
            outcomes: self.outcomes.clone(),
            clock: Arc::new(NullClock::stepping(1_000, 10)),
        };
        StateMonitor::new(deps, &config(self.users_per_job))
    }
}

fn job(cursor: u64) -> MonitorStateJobData {
    MonitorStateJobData {
        last_processed_user_id: cursor,
        discovery_node_endpoint: DISCOVERY.into(),
    }
}

fn unhealthy_list(output: &statemon_types::JobOutput, name: JobName) -> Vec<String> {
    output
        .find(name)
        .and_then(|j| j.as_reconciliation())
        .map(|d| d.unhealthy_peers.iter().map(|e| e.to_string()).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Cursor behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_cycle_advances_cursor_to_max_user_id() {
    let harness = Harness::new(vec![
        user(5, &["nodeA", "http://b"]),
        user(1, &["nodeA", "http://b"]),
        user(2, &["http://b"]),
    ])
    .health(NullPeerHealthCheck::with_unhealthy(["nodeA"]));
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    assert!(result.is_complete(), "unexpected error: {:?}", result.error);
    assert_eq!(result.output.job_count(), 3);
    assert_eq!(result.output.next_monitor_state().unwrap().last_processed_user_id, 5);
    assert_eq!(unhealthy_list(&result.output, JobName::FindSyncRequests), vec!["nodeA"]);
    assert_eq!(unhealthy_list(&result.output, JobName::FindReplicaSetUpdates), vec!["nodeA"]);
}

#[tokio::test]
async fn empty_batch_wraps_cursor_to_zero() {
    let harness = Harness::new(vec![user(1, &[]), user(2, &[])]);
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(2)).await;

    assert!(result.is_complete());
    assert!(result.snapshot.users.is_empty());
    assert_eq!(result.output.next_monitor_state().unwrap().last_processed_user_id, 0);
    assert_eq!(result.output.job_count(), 3);
}

#[tokio::test]
async fn fetch_failure_retries_same_cursor_with_placeholder() {
    let harness = Harness::new(vec![]).directory(NullUserDirectory::failing());
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(42)).await;

    assert_eq!(result.error.as_ref().map(|e| e.stage), Some(Stage::FetchBatch));
    assert_eq!(result.output.next_monitor_state().unwrap().last_processed_user_id, 42);
    let data = result
        .output
        .find(JobName::FindSyncRequests)
        .and_then(|j| j.as_reconciliation())
        .unwrap();
    assert_eq!(data.users, vec![UserRecord::placeholder(42)]);
    assert_eq!(harness.health.call_count(), 0);
    assert!(harness.clocks.queries().is_empty());
}

#[tokio::test]
async fn cursor_pages_through_users_and_wraps() {
    let harness = Harness::new(vec![user(1, &[]), user(2, &[]), user(3, &[])]).users_per_job(2);
    let monitor = harness.monitor();
    let logger = RecordingLogger::new();

    let mut cursors = Vec::new();
    let mut current = job(0);
    for _ in 0..4 {
        let result = monitor.run_cycle(&logger, &current).await;
        current = result.output.next_monitor_state().unwrap().clone();
        cursors.push(current.last_processed_user_id);
    }
    assert_eq!(cursors, vec![2, 3, 0, 2]);
}

// ---------------------------------------------------------------------------
// Snapshot contents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unhealthy_peers_are_union_of_health_check_and_silent_peers() {
    let harness = Harness::new(vec![user(1, &["http://a", "http://b"]), user(2, &["http://c"])])
        .health(NullPeerHealthCheck::with_unhealthy(["http://a"]))
        .clocks(
            NullPeerClockClient::new()
                .with_peer("http://b", PeerBehavior::Fail)
                .with_peer("http://c", PeerBehavior::Delay(Duration::from_secs(5))),
        );
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    assert!(result.is_complete());
    assert_eq!(
        unhealthy_list(&result.output, JobName::FindSyncRequests),
        vec!["http://a", "http://b", "http://c"]
    );
    let states = &result.snapshot.replica_states;
    assert!(states.contains_key(&Endpoint::new("http://a")));
    assert!(!states.contains_key(&Endpoint::new("http://b")));
    assert!(!states.contains_key(&Endpoint::new("http://c")));
    assert_eq!(states[&Endpoint::new(SELF)].len(), 2);
}

#[tokio::test]
async fn each_peer_is_queried_once_with_all_its_wallets() {
    let harness = Harness::new(vec![user(1, &["http://a"]), user(2, &["http://a"])]);
    let logger = RecordingLogger::new();

    harness.monitor().run_cycle(&logger, &job(0)).await;

    let mut queries = harness.clocks.queries();
    queries.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].0, Endpoint::new("http://a"));
    assert_eq!(queries[0].1, vec![Wallet::new("0x1"), Wallet::new("0x2")]);
}

#[tokio::test]
async fn sync_metrics_reflect_recorded_outcomes() {
    let store = Arc::new(MemorySyncOutcomeStore::new());
    for outcome in [Outcome::Success, Outcome::Success, Outcome::Success, Outcome::Failure] {
        store
            .increment(OutcomeKey {
                secondary: "http://a".into(),
                wallet: "0x1".into(),
                sync_type: SyncType::Recurring,
                day: 19_000,
                outcome,
            })
            .unwrap();
    }
    let harness = Harness::new(vec![user(1, &["http://a", "http://b"])]).outcomes(store);
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    let metrics = &result.snapshot.sync_metrics[&1];
    assert_eq!(metrics[&Endpoint::new("http://a")].success_rate, 0.75);
    assert_eq!(metrics[&Endpoint::new("http://b")].success_rate, 1.0);
}

// ---------------------------------------------------------------------------
// Stage failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_failure_emits_users_with_empty_maps() {
    let harness = Harness::new(vec![user(1, &["http://a"]), user(3, &["http://a"])])
        .health(NullPeerHealthCheck::failing());
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    assert_eq!(result.error.as_ref().map(|e| e.stage), Some(Stage::PeerHealth));
    assert_eq!(result.output.job_count(), 3);
    let data = result
        .output
        .find(JobName::FindReplicaSetUpdates)
        .and_then(|j| j.as_reconciliation())
        .unwrap();
    assert_eq!(data.users.len(), 2);
    assert!(data.unhealthy_peers.is_empty());
    assert!(data.replica_to_user_info_map.is_empty());
    assert!(data.user_secondary_sync_metrics_map.is_empty());
    assert!(harness.clocks.queries().is_empty());
    assert_eq!(result.output.next_monitor_state().unwrap().last_processed_user_id, 3);
}

#[tokio::test]
async fn metrics_failure_keeps_replica_state() {
    let harness = Harness::new(vec![user(1, &["http://a"])])
        .clocks(NullPeerClockClient::new().with_peer("http://a", PeerBehavior::Fail))
        .outcomes(Arc::new(FailingOutcomeStore));
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    assert_eq!(result.error.as_ref().map(|e| e.stage), Some(Stage::SyncMetrics));
    assert_eq!(unhealthy_list(&result.output, JobName::FindSyncRequests), vec!["http://a"]);
    assert!(!result.snapshot.replica_states.is_empty());
    assert!(result.snapshot.sync_metrics.is_empty());
    assert_eq!(result.output.job_count(), 3);
}

#[tokio::test]
async fn replica_state_failure_keeps_users_and_health_peers() {
    let harness = Harness::new(vec![user(1, &["http://a", "http://b"]), user(2, &["http://c"])])
        .health(NullPeerHealthCheck::with_unhealthy(["http://a"]))
        .clocks(NullPeerClockClient::new().with_peer(
            "http://b",
            PeerBehavior::PanicOnCancel(Duration::from_secs(5)),
        ));
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    assert_eq!(result.error.as_ref().map(|e| e.stage), Some(Stage::ReplicaState));
    assert_eq!(result.output.job_count(), 3);
    for name in [JobName::FindSyncRequests, JobName::FindReplicaSetUpdates] {
        let data = result
            .output
            .find(name)
            .and_then(|j| j.as_reconciliation())
            .unwrap();
        assert_eq!(data.users.len(), 2);
        assert_eq!(unhealthy_list(&result.output, name), vec!["http://a"]);
        assert!(data.replica_to_user_info_map.is_empty());
        assert!(data.user_secondary_sync_metrics_map.is_empty());
    }
    assert_eq!(result.output.next_monitor_state().unwrap().last_processed_user_id, 2);
    assert!(logger.contains("monitor-state replica_state Error"));
}

#[tokio::test]
async fn row_without_primary_does_not_pin_the_cursor() {
    use statemon_network::HttpUserDirectory;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/content_node"))
        .and(query_param("prev_user_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "user_id": 5, "wallet": "0x5", "primary": SELF,
                  "secondary1": "http://a", "secondary2": null },
                { "user_id": 6, "wallet": "0x6", "primary": null,
                  "secondary1": "http://a", "secondary2": null },
                { "user_id": 7, "wallet": "0x7", "primary": SELF,
                  "secondary1": "http://b", "secondary2": null }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/content_node"))
        .and(query_param("prev_user_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let deps = MonitorDeps {
        directory: Arc::new(HttpUserDirectory::new()),
        health: Arc::new(NullPeerHealthCheck::healthy()),
        clocks: Arc::new(NullPeerClockClient::new()),
        outcomes: Arc::new(MemorySyncOutcomeStore::new()),
        clock: Arc::new(NullClock::stepping(1_000, 10)),
    };
    let monitor = StateMonitor::new(deps, &config(100));
    let logger = RecordingLogger::new();
    let start = MonitorStateJobData {
        last_processed_user_id: 4,
        discovery_node_endpoint: server.uri(),
    };

    let first = monitor.run_cycle(&logger, &start).await;
    assert!(first.is_complete(), "unexpected error: {:?}", first.error);
    assert_eq!(first.snapshot.users.len(), 3);
    assert!(first.snapshot.users[1].is_placeholder());
    assert!(!first.snapshot.sync_metrics.contains_key(&6));
    let next = first.output.next_monitor_state().unwrap().clone();
    assert_eq!(next.last_processed_user_id, 7);

    let second = monitor.run_cycle(&logger, &next).await;
    assert!(second.is_complete());
    assert_eq!(second.output.next_monitor_state().unwrap().last_processed_user_id, 0);
}

#[tokio::test]
async fn every_failure_combination_emits_three_jobs() {
    for mask in 0u8..16 {
        let mut harness = Harness::new(vec![user(1, &["http://a"]), user(2, &["http://b"])]);
        if mask & 1 != 0 {
            harness = harness.directory(NullUserDirectory::failing());
        }
        if mask & 2 != 0 {
            harness = harness.health(NullPeerHealthCheck::failing());
        }
        if mask & 4 != 0 {
            harness = harness.outcomes(Arc::new(FailingOutcomeStore));
        }
        if mask & 8 != 0 {
            harness = harness.clocks(NullPeerClockClient::new().with_peer(
                "http://a",
                PeerBehavior::PanicOnCancel(Duration::from_secs(5)),
            ));
        }
        let logger = RecordingLogger::new();
        let result = harness.monitor().run_cycle(&logger, &job(7)).await;

        let names: Vec<JobName> = result
            .output
            .jobs(QueueName::StateMonitoring)
            .iter()
            .map(|j| j.job_name)
            .collect();
        assert_eq!(
            names,
            vec![
                JobName::FindSyncRequests,
                JobName::FindReplicaSetUpdates,
                JobName::MonitorState
            ],
            "mask {mask}"
        );
        assert_eq!(result.error.is_some(), mask != 0, "mask {mask}");
    }
}

#[tokio::test]
async fn stage_error_and_decision_tree_are_logged() {
    let harness = Harness::new(vec![user(1, &["http://a"])]).health(NullPeerHealthCheck::failing());
    let logger = RecordingLogger::new();

    let result = harness.monitor().run_cycle(&logger, &job(0)).await;

    assert!(logger
        .errors()
        .iter()
        .any(|l| l.contains("peer_health failed")));
    assert!(logger.contains("monitor-state peer_health Error"));
    assert!(logger.contains("monitor-state Decision Tree"));

    let stages: Vec<&str> = result.decision_tree.iter().map(|e| e.stage.as_str()).collect();
    assert_eq!(
        stages,
        vec![
            "BEGIN monitor-state",
            "fetch_batch Success",
            "peer_health Error",
            "END monitor-state"
        ]
    );
    let last = result.decision_tree.last().unwrap();
    assert_eq!(last.full_duration, Some(last.time - result.decision_tree[0].time));
}

// ---------------------------------------------------------------------------
// Job payload validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_job_runs_cycle_for_valid_payload() {
    let harness = Harness::new(vec![user(4, &[])]);
    let logger = RecordingLogger::new();

    let output = harness
        .monitor()
        .process_job(
            Some(&logger),
            &json!({ "lastProcessedUserId": 0, "discoveryNodeEndpoint": DISCOVERY }),
        )
        .await
        .unwrap();

    assert_eq!(output.job_count(), 3);
    assert_eq!(output.next_monitor_state().unwrap().last_processed_user_id, 4);
    assert_eq!(
        harness.directory.calls(),
        vec![(DISCOVERY.to_string(), 0, 100)]
    );
}

#[tokio::test]
async fn invalid_payload_fails_before_any_side_effect() {
    let harness = Harness::new(vec![user(4, &[])]);
    let monitor = harness.monitor();
    let logger = RecordingLogger::new();

    let bad_cursor = monitor
        .process_job(
            Some(&logger),
            &json!({ "lastProcessedUserId": "4", "discoveryNodeEndpoint": DISCOVERY }),
        )
        .await;
    assert!(matches!(
        bad_cursor,
        Err(ValidationError::InvalidLastProcessedUserId { .. })
    ));

    let bad_endpoint = monitor
        .process_job(
            Some(&logger),
            &json!({ "lastProcessedUserId": 4, "discoveryNodeEndpoint": null }),
        )
        .await;
    assert!(matches!(
        bad_endpoint,
        Err(ValidationError::InvalidDiscoveryNodeEndpoint { .. })
    ));

    let no_logger = monitor
        .process_job(
            None,
            &json!({ "lastProcessedUserId": 4, "discoveryNodeEndpoint": DISCOVERY }),
        )
        .await;
    assert_eq!(no_logger.unwrap_err(), ValidationError::MissingLogger);

    assert!(harness.directory.calls().is_empty());
    assert_eq!(harness.health.call_count(), 0);
    assert!(logger.lines().is_empty());
}

// ---------------------------------------------------------------------------
// Self-scheduling loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_once_dispatches_reconciliation_jobs_and_returns_next_job() {
    let harness = Harness::new(vec![user(1, &["http://a"]), user(9, &["http://a"])]);
    let (sink, mut rx) = ChannelJobSink::new(8);
    let monitor_loop = MonitorLoop::new(
        Arc::new(harness.monitor()),
        Arc::new(sink),
        Duration::from_millis(0),
    );

    let next = monitor_loop.run_once(&job(0), 1).await;
    assert_eq!(next, job(9));

    let (queue, first) = rx.recv().await.unwrap();
    let (_, second) = rx.recv().await.unwrap();
    assert_eq!(queue, QueueName::StateMonitoring);
    assert_eq!(first.job_name, JobName::FindSyncRequests);
    assert_eq!(second.job_name, JobName::FindReplicaSetUpdates);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn loop_stops_on_shutdown() {
    let harness = Harness::new(vec![user(1, &[]), user(2, &[])]).users_per_job(1);
    let (sink, mut rx) = ChannelJobSink::new(64);
    let monitor_loop = Arc::new(MonitorLoop::new(
        Arc::new(harness.monitor()),
        Arc::new(sink),
        Duration::from_millis(1),
    ));
    let shutdown = ShutdownController::new();

    let handle = {
        let monitor_loop = Arc::clone(&monitor_loop);
        let rx = shutdown.subscribe();
        tokio::spawn(async move { monitor_loop.run(job(0), rx).await })
    };

    // Two cycles' worth of reconciliation jobs.
    for _ in 0..4 {
        rx.recv().await.unwrap();
    }
    shutdown.shutdown();

    let cycles = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop")
        .unwrap();
    // The second cycle may still be in flight when the signal lands.
    assert!(cycles >= 1);

    let calls = harness.directory.calls();
    assert_eq!(calls[0].1, 0);
    assert_eq!(calls[1].1, 1);
}

#[tokio::test]
async fn loop_does_not_start_after_shutdown() {
    let harness = Harness::new(vec![user(1, &[])]);
    let (sink, _rx) = ChannelJobSink::new(8);
    let monitor_loop = MonitorLoop::new(
        Arc::new(harness.monitor()),
        Arc::new(sink),
        Duration::from_millis(1),
    );
    let shutdown = ShutdownController::new();
    let rx = shutdown.subscribe();
    shutdown.shutdown();

    assert_eq!(monitor_loop.run(job(0), rx).await, 0);
    assert!(harness.directory.calls().is_empty());
}
