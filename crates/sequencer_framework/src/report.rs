//! Run outcome reporting.

use std::fmt;

use sequencer_random::RandomError;
use sequencer_store::StoreError;

use crate::error::ProcessError;
use crate::process_code::ProcessCode;

/// Lifecycle of a sequencer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built and validated; `run` has not been called.
    Configured,
    /// Events are being processed.
    Running,
    /// Every event and every end-of-run call succeeded.
    Completed,
    /// At least one failure was recorded.
    Failed,
}

impl RunState {
    /// Lower-case state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Nothing failed.
    Completed,
    /// Something failed; see [`RunReport::failures`].
    Failed,
}

/// The pipeline step in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Reader skipping before the first event.
    Skip,
    /// A context decorator.
    Decorate,
    /// A reader.
    Read,
    /// An algorithm.
    Execute,
    /// A writer's per-event call.
    Write,
    /// A writer's end-of-run call.
    EndRun,
    /// A service's finalize call.
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Skip => "skip",
            Self::Decorate => "decorate",
            Self::Read => "read",
            Self::Execute => "execute",
            Self::Write => "write",
            Self::EndRun => "end_run",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Why a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A collection was written twice.
    DuplicateKey,
    /// A collection was read before anything wrote it.
    NotFound,
    /// A collection was read with the wrong type.
    TypeMismatch,
    /// Missing setup, e.g. an unseeded random service.
    NotConfigured,
    /// The component returned [`ProcessCode::Abort`].
    ComponentAbort,
    /// The component returned some other error.
    ComponentError,
    /// The component panicked.
    Panic,
}

impl FailureKind {
    /// Classify a component error.
    #[must_use]
    pub fn of(error: &ProcessError) -> Self {
        match error {
            ProcessError::Store(StoreError::DuplicateKey { .. }) => Self::DuplicateKey,
            ProcessError::Store(StoreError::NotFound { .. }) => Self::NotFound,
            ProcessError::Store(StoreError::TypeMismatch { .. }) => Self::TypeMismatch,
            ProcessError::Random(RandomError::NotConfigured { .. }) => Self::NotConfigured,
            ProcessError::Random(RandomError::InvalidParameters { .. }) | ProcessError::Failed(_) => {
                Self::ComponentError
            }
        }
    }
}

/// One recorded failure, with enough detail to re-run that event alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFailure {
    /// The event, or `None` for run-level steps (skip, end of run).
    pub event: Option<u64>,
    /// The failing component.
    pub component: String,
    /// Where in the pipeline it failed.
    pub stage: Stage,
    /// Why it failed.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for EventFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            Some(event) => write!(f, "event {event}: ")?,
            None => f.write_str("run: ")?,
        }
        write!(
            f,
            "{} '{}' failed ({:?}): {}",
            self.stage, self.component, self.kind, self.message
        )
    }
}

/// Summary returned by [`Sequencer::run`](crate::Sequencer::run).
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier correlating this run's log lines.
    pub run_id: String,
    /// Overall outcome.
    pub status: RunStatus,
    /// First event number processed.
    pub first_event: u64,
    /// Number of events whose pipeline finished without failure.
    pub processed_events: u64,
    /// Number of events attempted.
    pub total_events: u64,
    /// All failures, ordered by event number (run-level ones last).
    pub failures: Vec<EventFailure>,
}

impl RunReport {
    /// The run outcome as a [`ProcessCode`].
    #[must_use]
    pub fn code(&self) -> ProcessCode {
        match self.status {
            RunStatus::Completed => ProcessCode::Success,
            RunStatus::Failed => ProcessCode::Abort,
        }
    }

    /// Returns `true` if the run completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Event numbers that failed, ascending.
    #[must_use]
    pub fn failed_events(&self) -> Vec<u64> {
        let mut events: Vec<u64> = self.failures.iter().filter_map(|f| f.event).collect();
        events.dedup();
        events
    }
}

/// Order failures by event, run-level failures last.
pub(crate) fn sort_failures(failures: &mut [EventFailure]) {
    failures.sort_by(|a, b| {
        let key = |f: &EventFailure| (f.event.is_none(), f.event.unwrap_or(0), f.stage);
        key(a).cmp(&key(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(event: Option<u64>, stage: Stage) -> EventFailure {
        EventFailure {
            event,
            component: "c".to_string(),
            stage,
            kind: FailureKind::ComponentAbort,
            message: String::new(),
        }
    }

    #[test]
    fn test_failure_kind_classification() {
        let not_found = ProcessError::Store(StoreError::NotFound {
            name: "missing".into(),
            event: 0,
        });
        assert_eq!(FailureKind::of(&not_found), FailureKind::NotFound);
        assert_eq!(
            FailureKind::of(&ProcessError::failed("bad")),
            FailureKind::ComponentError
        );
        let unseeded = ProcessError::Random(RandomError::NotConfigured {
            service: "rng".into(),
        });
        assert_eq!(FailureKind::of(&unseeded), FailureKind::NotConfigured);
    }

    #[test]
    fn test_sort_failures_run_level_last() {
        let mut failures = vec![
            failure(None, Stage::EndRun),
            failure(Some(7), Stage::Write),
            failure(Some(2), Stage::Execute),
        ];
        sort_failures(&mut failures);
        let events: Vec<Option<u64>> = failures.iter().map(|f| f.event).collect();
        assert_eq!(events, vec![Some(2), Some(7), None]);
    }

    #[test]
    fn test_report_code() {
        let report = RunReport {
            run_id: "r".into(),
            status: RunStatus::Failed,
            first_event: 0,
            processed_events: 9,
            total_events: 10,
            failures: vec![failure(Some(4), Stage::Execute)],
        };
        assert_eq!(report.code(), ProcessCode::Abort);
        assert!(!report.is_completed());
        assert_eq!(report.failed_events(), vec![4]);
    }

    #[test]
    fn test_failure_display() {
        let f = EventFailure {
            event: Some(3),
            component: "Doubler".into(),
            stage: Stage::Execute,
            kind: FailureKind::NotFound,
            message: "collection 'x' not found in event 3".into(),
        };
        assert_eq!(
            f.to_string(),
            "event 3: execute 'Doubler' failed (NotFound): collection 'x' not found in event 3"
        );
    }
}
