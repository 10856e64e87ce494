//! Prometheus metrics for the state monitor.
//!
//! [`MonitorMetrics`] owns a dedicated [`Registry`]; the daemon encodes it
//! into the text exposition format on demand.

use std::time::Duration;

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::Stage;
use crate::monitor::CycleResult;
use crate::NodeError;

pub struct MonitorMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Monitoring cycles run, complete or not.
    pub cycles_total: IntCounter,
    /// Cycles cut short, by the stage that failed.
    pub stage_failures_total: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Users in the most recent batch.
    pub batch_size: IntGauge,
    /// Unhealthy peers in the most recent snapshot.
    pub unhealthy_peers: IntGauge,
    /// Cursor handed to the next cycle.
    pub last_processed_user_id: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of one cycle, in milliseconds.
    pub cycle_duration_ms: Histogram,
}

impl MonitorMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let cycles_total = register_int_counter_with_registry!(
            Opts::new("statemon_cycles_total", "Monitoring cycles run"),
            registry
        )?;

        let stage_failures_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "statemon_stage_failures_total",
                "Monitoring cycles cut short by a failing stage"
            ),
            &["stage"],
            registry
        )?;
        // Pre-create every label so all series are exported from the start.
        for stage in Stage::ALL {
            stage_failures_total.with_label_values(&[stage.as_str()]);
        }

        let batch_size = register_int_gauge_with_registry!(
            Opts::new("statemon_batch_size", "Users in the most recent batch"),
            registry
        )?;

        let unhealthy_peers = register_int_gauge_with_registry!(
            Opts::new(
                "statemon_unhealthy_peers",
                "Unhealthy peers in the most recent snapshot"
            ),
            registry
        )?;

        let last_processed_user_id = register_int_gauge_with_registry!(
            Opts::new(
                "statemon_last_processed_user_id",
                "Cursor handed to the next monitoring cycle"
            ),
            registry
        )?;

        // 1 ms → ~16 s.
        let cycle_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "statemon_cycle_duration_ms",
                "Monitoring cycle duration in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            cycles_total,
            stage_failures_total,
            batch_size,
            unhealthy_peers,
            last_processed_user_id,
            cycle_duration_ms,
        })
    }

    pub fn observe_cycle(&self, result: &CycleResult, elapsed: Duration) {
        self.cycles_total.inc();
        if let Some(error) = &result.error {
            self.stage_failures_total
                .with_label_values(&[error.stage.as_str()])
                .inc();
        }
        self.batch_size.set(result.snapshot.users.len() as i64);
        self.unhealthy_peers
            .set(result.snapshot.unhealthy_peers.len() as i64);
        if let Some(next) = result.output.next_monitor_state() {
            self.last_processed_user_id
                .set(i64::try_from(next.last_processed_user_id).unwrap_or(i64::MAX));
        }
        self.cycle_duration_ms
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Config(format!("metrics not utf-8: {e}")))
    }
}
