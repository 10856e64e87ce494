//! In-process self-scheduling loop.
//!
//! Stands in for the external job runtime: each cycle's `monitor-state` job
//! is fed straight back into the monitor, and the reconciliation jobs are
//! handed to a [`JobSink`]. Cycles run strictly one at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use statemon_types::{JobDescriptor, JobName, MonitorStateJobData, QueueName};
use statemon_utils::{format_duration, TracingJobLogger};

use crate::metrics::MonitorMetrics;
use crate::monitor::StateMonitor;
use crate::NodeError;

/// Destination for reconciliation jobs.
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn dispatch(&self, queue: QueueName, job: JobDescriptor) -> Result<(), NodeError>;
}

/// Sink that only logs a summary of each job.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingJobSink;

#[async_trait]
impl JobSink for LoggingJobSink {
    async fn dispatch(&self, queue: QueueName, job: JobDescriptor) -> Result<(), NodeError> {
        let (users, unhealthy) = job
            .as_reconciliation()
            .map(|data| (data.users.len(), data.unhealthy_peers.len()))
            .unwrap_or_default();
        tracing::info!(
            queue = queue.as_str(),
            job_name = %job.job_name,
            users,
            unhealthy_peers = unhealthy,
            "reconciliation job ready"
        );
        Ok(())
    }
}

/// Sink that forwards jobs over a bounded channel.
#[derive(Clone)]
pub struct ChannelJobSink {
    tx: mpsc::Sender<(QueueName, JobDescriptor)>,
}

impl ChannelJobSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<(QueueName, JobDescriptor)>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobSink for ChannelJobSink {
    async fn dispatch(&self, queue: QueueName, job: JobDescriptor) -> Result<(), NodeError> {
        self.tx
            .send((queue, job))
            .await
            .map_err(|_| NodeError::JobSink("job receiver dropped".into()))
    }
}

pub struct MonitorLoop {
    monitor: Arc<StateMonitor>,
    sink: Arc<dyn JobSink>,
    metrics: Option<Arc<MonitorMetrics>>,
    interval: Duration,
}

impl MonitorLoop {
    pub fn new(monitor: Arc<StateMonitor>, sink: Arc<dyn JobSink>, interval: Duration) -> Self {
        Self {
            monitor,
            sink,
            metrics: None,
            interval,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MonitorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run one cycle, dispatch its reconciliation jobs and return the next
    /// `monitor-state` payload.
    ///
    /// Dispatch failures are logged; they never stop the cursor from moving.
    pub async fn run_once(&self, job: &MonitorStateJobData, job_id: u64) -> MonitorStateJobData {
        let logger = TracingJobLogger::new(JobName::MonitorState.as_str(), job_id.to_string());
        let started = Instant::now();
        let result = self.monitor.run_cycle(&logger, job).await;
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.observe_cycle(&result, elapsed);
        }

        for (queue, jobs) in &result.output.jobs_to_enqueue {
            for descriptor in jobs.iter().filter(|j| j.job_name.is_reconciliation()) {
                if let Err(e) = self.sink.dispatch(*queue, descriptor.clone()).await {
                    tracing::error!(job_name = %descriptor.job_name, "failed to dispatch job: {e}");
                }
            }
        }

        let next = result
            .output
            .next_monitor_state()
            .cloned()
            .unwrap_or_else(|| job.clone());
        tracing::info!(
            job_id,
            complete = result.is_complete(),
            next_cursor = next.last_processed_user_id,
            "monitor cycle finished in {}",
            format_duration(elapsed.as_millis() as u64)
        );
        next
    }

    /// Run cycles back to back, pausing `interval` between them, until
    /// `shutdown` fires. Returns the number of cycles completed.
    pub async fn run(
        &self,
        initial: MonitorStateJobData,
        mut shutdown: broadcast::Receiver<()>,
    ) -> u64 {
        let mut job = initial;
        let mut completed = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                next = self.run_once(&job, completed + 1) => {
                    job = next;
                    completed += 1;
                }
            }
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::info!(
            cycles = completed,
            cursor = job.last_processed_user_id,
            "monitor loop stopped"
        );
        completed
    }
}
