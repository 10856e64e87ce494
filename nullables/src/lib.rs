//! In-memory stand-ins for every collaborator of the monitor.
//!
//! Each type here implements one of the monitor's seams (clock, discovery
//! node, peer health probes, peer clock queries, outcome storage, job
//! logger) without touching the network. Answers are fixed up front and can
//! be scripted to fail, hang or panic per peer, so pipeline tests see the
//! same outcome on every run.

pub mod clock;
pub mod clock_client;
pub mod directory;
pub mod health;
pub mod logger;
pub mod store;

pub use clock::NullClock;
pub use clock_client::{NullPeerClockClient, PeerBehavior};
pub use directory::NullUserDirectory;
pub use health::NullPeerHealthCheck;
pub use logger::{LogLevel, LogLine, RecordingLogger};
pub use store::FailingOutcomeStore;
