//! Job lifecycle
//!
//! ```text
//! Idle ──trigger──▶ Running ──exit 0────────▶ Succeeded
//!                      ├─────exit ≠ 0 / signal ▶ Failed
//!                      └─────spawn error─────▶ LaunchFailure
//! ```
//!
//! Terminal states are final. A re-trigger builds a new [`Job`].

use super::planner::{ArtifactTarget, PlannedInvocation, ToolCommand};
use super::request::JobRequest;
use super::supervisor::Outcome;
use super::JobId;
use crate::classify::{self, DiagnosticRecord, RuleTable, Severity};
use crate::error::TransitionError;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Everything a failed run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// `None` when the process died from a signal.
    pub exit_code: Option<i32>,
    pub records: Vec<DiagnosticRecord>,
    /// The failure came out of the LaTeX compilation step.
    pub latex_failure: bool,
    /// Compilation log, as reported by the tool or derived from the target.
    pub log_path: Option<PathBuf>,
}

impl FailureReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.records.iter().filter(|r| r.severity == severity).count()
    }

    /// "Open Log" is only offered for LaTeX compilation failures.
    pub fn offers_open_log(&self) -> bool {
        self.latex_failure && self.log_path.is_some()
    }

    pub fn headline(&self, tool: &str) -> String {
        match self.exit_code {
            Some(code) => format!("{} failed with exit code {}", tool, code),
            None => format!("{} was terminated by a signal", tool),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Running,
    Succeeded {
        /// The tool's final status line, verbatim.
        summary: String,
        artifact: PathBuf,
    },
    Failed(FailureReport),
    LaunchFailure {
        message: String,
    },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Succeeded { .. } => "succeeded",
            JobState::Failed(_) => "failed",
            JobState::LaunchFailure { .. } => "launch failure",
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSnapshot<'a> {
    Idle,
    Running {
        target: &'a Path,
        started_at: DateTime<Local>,
        elapsed: Duration,
    },
    Succeeded {
        target: &'a Path,
        summary: &'a str,
        artifact: &'a Path,
    },
    Failed {
        target: &'a Path,
        report: &'a FailureReport,
    },
    LaunchFailure {
        target: &'a Path,
        message: &'a str,
    },
}

#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub request: JobRequest,
    pub command: ToolCommand,
    pub artifact_target: ArtifactTarget,
    pub started_at: DateTime<Local>,
    started: Instant,
    /// Raw captured output; empty until the process finished.
    output: String,
    elapsed: Option<Duration>,
    state: JobState,
}

impl Job {
    pub fn start(planned: PlannedInvocation, started_at: DateTime<Local>) -> Self {
        Self {
            id: JobId::new(),
            request: planned.request,
            command: planned.command,
            artifact_target: planned.artifact,
            started_at,
            started: Instant::now(),
            output: String::new(),
            elapsed: None,
            state: JobState::Running,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Wall time of the run, or time so far while running.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    pub fn snapshot(&self) -> JobSnapshot<'_> {
        let target = self.request.target.as_path();
        match &self.state {
            JobState::Running => JobSnapshot::Running {
                target,
                started_at: self.started_at,
                elapsed: self.elapsed(),
            },
            JobState::Succeeded { summary, artifact } => JobSnapshot::Succeeded {
                target,
                summary,
                artifact,
            },
            JobState::Failed(report) => JobSnapshot::Failed { target, report },
            JobState::LaunchFailure { message } => JobSnapshot::LaunchFailure { target, message },
        }
    }

    /// Apply the supervisor's outcome. Only a running job can finish, and
    /// only once; classification happens here, before the state changes.
    pub fn finish(
        &mut self,
        outcome: Outcome,
        elapsed: Duration,
        rules: &RuleTable,
    ) -> Result<&JobState, TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::NotRunning(self.id));
        }

        let next = match outcome {
            Outcome::LaunchFailed { message } => JobState::LaunchFailure { message },
            Outcome::Exited { code, output } => {
                self.output = output;
                if code == Some(0) {
                    self.succeeded(rules)
                } else {
                    JobState::Failed(self.failed(code, rules))
                }
            }
        };

        self.elapsed = Some(elapsed);
        self.state = next;
        Ok(&self.state)
    }

    fn succeeded(&self, rules: &RuleTable) -> JobState {
        let summary = classify::summary_line(&self.output, rules).unwrap_or_default();
        let artifact = self.artifact_target.resolve(
            Some(summary).filter(|s| !s.is_empty()),
            &self.request.working_dir,
            rules,
        );
        JobState::Succeeded {
            summary: summary.to_string(),
            artifact,
        }
    }

    fn failed(&self, exit_code: Option<i32>, rules: &RuleTable) -> FailureReport {
        let reported = rules
            .find_log_path(&self.output)
            .map(|p| self.request.working_dir.join(p));
        let classified = classify::classify(&self.output, reported.as_deref(), rules);

        let log_path = reported.or_else(|| {
            classified.latex_failure.then(|| {
                self.request
                    .working_dir
                    .join(format!("{}.log", self.request.stem()))
            })
        });

        FailureReport {
            exit_code,
            records: classified.records,
            latex_failure: classified.latex_failure,
            log_path,
        }
    }
}
