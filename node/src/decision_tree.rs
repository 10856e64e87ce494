//! Append-only, timestamped log of one cycle's stage outcomes.
//!
//! The tree exists for observability only: recording or flushing it never
//! changes what the cycle emits.

use serde::Serialize;
use serde_json::Value;

use statemon_utils::{Clock, JobLogger};

const LOG_PREFIX: &str = "monitor-state";

/// Flushing computes `fullDuration` only once at least this many entries exist.
const MIN_ENTRIES_FOR_FULL_DURATION: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTreeEntry {
    pub stage: String,
    pub data: Value,
    /// Milliseconds since the Unix epoch.
    pub time: u64,
    /// Milliseconds since the previous entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Milliseconds from the first entry; set on the last entry at flush.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_duration: Option<u64>,
}

pub struct DecisionTree<'a> {
    entries: Vec<DecisionTreeEntry>,
    logger: &'a dyn JobLogger,
    clock: &'a dyn Clock,
}

impl<'a> DecisionTree<'a> {
    pub fn new(logger: &'a dyn JobLogger, clock: &'a dyn Clock) -> Self {
        Self {
            entries: Vec::new(),
            logger,
            clock,
        }
    }

    pub fn entries(&self) -> &[DecisionTreeEntry] {
        &self.entries
    }

    /// Append a stage outcome and log it.
    pub fn record(&mut self, stage: impl Into<String>, data: Value) {
        let stage = stage.into();
        let time = self.clock.now_millis();
        let duration = self
            .entries
            .last()
            .map(|prev| time.saturating_sub(prev.time));

        let mut line = format!("{LOG_PREFIX} {stage} - Data {data}");
        if let Some(d) = duration {
            line.push_str(&format!(" - Duration {d}ms"));
        }
        self.logger.info(&line);

        self.entries.push(DecisionTreeEntry {
            stage,
            data,
            time,
            duration,
            full_duration: None,
        });
    }

    /// Emit the whole tree as one log line and hand back its entries.
    pub fn flush(self) -> Vec<DecisionTreeEntry> {
        self.flush_with(|entries| serde_json::to_string(entries))
    }

    fn flush_with<F>(mut self, render: F) -> Vec<DecisionTreeEntry>
    where
        F: FnOnce(&[DecisionTreeEntry]) -> Result<String, serde_json::Error>,
    {
        if self.entries.len() >= MIN_ENTRIES_FOR_FULL_DURATION {
            let start = self.entries[0].time;
            if let Some(last) = self.entries.last_mut() {
                last.full_duration = Some(last.time.saturating_sub(start));
            }
        }

        match render(&self.entries) {
            Ok(json) => self.logger.info(&format!("{LOG_PREFIX} Decision Tree{json}")),
            Err(e) => self.logger.error(&format!(
                "Error printing {LOG_PREFIX} Decision Tree {:?}: {e}",
                self.entries
            )),
        }
        self.entries
    }
}
