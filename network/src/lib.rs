//! Network collaborators of the state monitor.
//!
//! The monitor talks to two kinds of remote services: a discovery node that
//! knows which users this node serves, and peer storage nodes that report
//! their health and per-wallet clock values. Each is reached through a trait
//! so the pipeline can be driven by in-memory doubles in tests.

pub mod clock_status;
pub mod discovery;
pub mod error;
pub mod health;
pub mod traits;

pub use clock_status::{HttpPeerClockClient, DEFAULT_MAX_CLOCK_FETCH_BATCH_SIZE};
pub use discovery::HttpUserDirectory;
pub use error::NetworkError;
pub use health::{collect_peers, HttpPeerHealthCheck};
pub use traits::{PeerClockClient, PeerHealthCheck, UserDirectory, WalletClock};
