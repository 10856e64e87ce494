//! Shared utilities for the replica state monitor.

pub mod logging;
pub mod time;

pub use logging::{JobLogger, TracingJobLogger};
pub use time::{day_index, format_duration, Clock, SystemClock, SECS_PER_DAY};
