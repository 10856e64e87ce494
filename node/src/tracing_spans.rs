//! Pre-built [`tracing::Span`] constructors for monitor operations.
//!
//! Using consistent span names and field sets makes it easy to filter and
//! correlate one cycle's stage logs and peer queries.

use tracing::{info_span, Span};

/// Span covering one full monitoring cycle.
pub fn monitor_cycle_span(cursor: u64, discovery: &str) -> Span {
    info_span!("monitor_cycle", cursor = cursor, discovery = %discovery)
}

/// Span covering a single pipeline stage within a cycle.
pub fn pipeline_stage_span(stage: &str) -> Span {
    info_span!("pipeline_stage", stage = %stage)
}

/// Span covering one peer's clock status query.
pub fn peer_query_span(peer: &str, wallet_count: usize) -> Span {
    info_span!("peer_query", peer = %peer, wallets = wallet_count)
}
