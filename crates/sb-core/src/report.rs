//! Submission outcomes and progress reporting.
//!
//! Outcomes are recorded in completion order; the console layer consumes
//! progress through a sink.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ServiceError;

/// One progress update: how many submissions are done and total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Sink for progress events. The submitter calls this each time a
/// submission completes.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Result of submitting one prediction.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub instance_id: String,
    /// Parsed response body on success.
    pub result: Result<Value, ServiceError>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// All outcomes of a run, in completion order.
#[derive(Debug, Clone, Default)]
pub struct SubmissionReport {
    pub outcomes: Vec<SubmissionOutcome>,
}

impl SubmissionReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SubmissionOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ServiceError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    /// True when nothing failed (an empty run counts as success).
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Format a single progress line for display.
#[must_use]
pub fn format_progress_line(event: ProgressEvent) -> String {
    format!("Submitting predictions {}/{}...", event.done, event.total)
}

/// Progress sink printing every update to stderr. `None` for single-item runs.
pub fn stderr_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    Some(Arc::new(|ev: ProgressEvent| {
        eprintln!("{}", format_progress_line(ev));
    }))
}
