//! Per-job logging capability.

/// Minimal logger handed to a job processor by the job runtime.
///
/// Lines written here are scoped to one job; the runtime decides where they
/// go. The monitor never needs more than these two levels.
pub trait JobLogger: Send + Sync {
    fn info(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// [`JobLogger`] that forwards to `tracing` with the job's name and id attached.
#[derive(Clone, Debug)]
pub struct TracingJobLogger {
    job_name: String,
    job_id: String,
}

impl TracingJobLogger {
    pub fn new(job_name: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            job_id: job_id.into(),
        }
    }
}

impl JobLogger for TracingJobLogger {
    fn info(&self, msg: &str) {
        tracing::info!(job_name = %self.job_name, job_id = %self.job_id, "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(job_name = %self.job_name, job_id = %self.job_id, "{msg}");
    }
}

impl std::fmt::Debug for dyn JobLogger + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn JobLogger")
    }
}
