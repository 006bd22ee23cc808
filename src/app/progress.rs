//! Progress reporting seam between downloads and the front end
//!
//! The downloader pushes the cumulative number of bytes written so far (never
//! deltas); the sink decides how to show it.

use std::sync::Mutex;

/// Receives transfer progress for one file at a time
pub trait ProgressSink: Send + Sync {
    /// A new transfer begins; `total` is the expected size when known
    fn start(&self, title: &str, total: Option<u64>);

    /// Cumulative bytes written for the current transfer
    fn update(&self, written: u64);

    /// The current transfer finished
    fn finish(&self);
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn start(&self, _title: &str, _total: Option<u64>) {}

    fn update(&self, _written: u64) {}

    fn finish(&self) {}
}

/// Event captured by [`RecordingProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressRecord {
    Started { title: String, total: Option<u64> },
    Updated(u64),
    Finished,
}

/// Keeps every event, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingProgress {
    records: Mutex<Vec<ProgressRecord>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn records(&self) -> Vec<ProgressRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Titles of every transfer started
    pub fn titles(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                ProgressRecord::Started { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    fn push(&self, record: ProgressRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

impl ProgressSink for RecordingProgress {
    fn start(&self, title: &str, total: Option<u64>) {
        self.push(ProgressRecord::Started {
            title: title.to_string(),
            total,
        });
    }

    fn update(&self, written: u64) {
        self.push(ProgressRecord::Updated(written));
    }

    fn finish(&self) {
        self.push(ProgressRecord::Finished);
    }
}
