//! Progress reporting for refresh jobs.
//!
//! A unit is one symbol, sector or year depending on the job.

use std::sync::Mutex;

use tracing::{info, warn};

/// Progress callback trait for job runs.
pub trait JobProgress: Send + Sync {
    /// Called when a unit starts.
    fn on_start(&self, unit: &str, index: usize, total: usize);

    /// Called when a unit finishes. `detail` is a short human summary on
    /// success or the error text on failure.
    fn on_complete(&self, unit: &str, index: usize, total: usize, result: Result<&str, &str>);

    /// Called once the whole job is done.
    fn on_job_complete(&self, job: &str, succeeded: usize, failed: usize);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl JobProgress for LogProgress {
    fn on_start(&self, unit: &str, index: usize, total: usize) {
        info!(%unit, "[{}/{}] starting", index + 1, total);
    }

    fn on_complete(&self, unit: &str, index: usize, total: usize, result: Result<&str, &str>) {
        match result {
            Ok(detail) => info!(%unit, "[{}/{}] done: {detail}", index + 1, total),
            Err(error) => warn!(%unit, %error, "[{}/{}] failed", index + 1, total),
        }
    }

    fn on_job_complete(&self, job: &str, succeeded: usize, failed: usize) {
        info!(%job, succeeded, failed, "job complete");
    }
}

/// A progress event, as recorded by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(String),
    Succeeded(String),
    Failed(String, String),
    JobComplete { succeeded: usize, failed: usize },
}

/// Keeps every event in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Units that failed, in order.
    pub fn failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Failed(unit, _) => Some(unit),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl JobProgress for RecordingProgress {
    fn on_start(&self, unit: &str, _index: usize, _total: usize) {
        self.push(ProgressEvent::Started(unit.to_string()));
    }

    fn on_complete(&self, unit: &str, _index: usize, _total: usize, result: Result<&str, &str>) {
        self.push(match result {
            Ok(_) => ProgressEvent::Succeeded(unit.to_string()),
            Err(e) => ProgressEvent::Failed(unit.to_string(), e.to_string()),
        });
    }

    fn on_job_complete(&self, _job: &str, succeeded: usize, failed: usize) {
        self.push(ProgressEvent::JobComplete { succeeded, failed });
    }
}
