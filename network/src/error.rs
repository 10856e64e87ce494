use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("peer {peer} timed out after {after_ms}ms")]
    Timeout { peer: String, after_ms: u64 },

    #[error("health check unavailable: {0}")]
    HealthCheck(String),
}
