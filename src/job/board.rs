//! Job board: the single owner of every job
//!
//! Lives on the event loop. Triggers come in as selections, supervisor
//! results as [`CompletionEvent`]s, user actions as [`DialogIntent`]s; all
//! side effects go out through a [`Host`].

use super::planner::{self, ToolCommand};
use super::state::{Job, JobSnapshot, JobState};
use super::supervisor::CompletionEvent;
use super::JobId;
use crate::classify::{self, RuleTable};
use crate::config::Config;
use crate::context::ContextSnapshot;
use crate::error::{TransitionError, TriggerError};
use crate::host::{Host, Notice, NoticeKind};
use crate::search::{search_filter, FilterState, SearchView, SeverityFilter};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the caller must spawn after a successful trigger.
#[derive(Debug, Clone)]
pub struct Launch {
    pub job_id: JobId,
    /// Resolved target; the key for later intents.
    pub target: PathBuf,
    pub command: ToolCommand,
}

/// Actions the result view can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogIntent {
    Dismiss,
    OpenLog,
    CopyOutput,
    SetSearchTerm(String),
    SetSeverityFilter(SeverityFilter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenLogOutcome {
    Opened(PathBuf),
    /// The log is gone from disk; one notice was emitted.
    Missing(PathBuf),
    /// The job has no log to offer.
    NotOffered,
}

/// One selected file and the latest job run for it.
#[derive(Debug)]
struct Interaction {
    job: Job,
    filter: FilterState,
}

pub struct JobBoard {
    ctx: Arc<ContextSnapshot>,
    config: Arc<Config>,
    rules: Arc<RuleTable>,
    interactions: HashMap<PathBuf, Interaction>,
    by_id: HashMap<JobId, PathBuf>,
}

impl JobBoard {
    pub fn new(ctx: Arc<ContextSnapshot>, config: Arc<Config>, rules: Arc<RuleTable>) -> Self {
        Self {
            ctx,
            config,
            rules,
            interactions: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<ContextSnapshot> {
        &self.ctx
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Plan and register a job for `selection`.
    ///
    /// Refused while a job for the same file is still running. A finished job
    /// for the same file is replaced, along with its filter state.
    pub fn trigger(
        &mut self,
        selection: &[PathBuf],
        now: DateTime<Local>,
        host: &mut impl Host,
    ) -> Result<Launch, TriggerError> {
        let planned = match planner::plan(selection, &self.ctx, &self.config, now) {
            Ok(planned) => planned,
            Err(e) => {
                warn!(error = %e, "planning failed");
                host.notify(Notice::new(NoticeKind::Rejected, "Cannot create archive", e.to_string()));
                return Err(e.into());
            }
        };

        let key = planned.request.target.clone();
        if let Some(existing) = self.interactions.get(&key) {
            if !existing.job.state().is_terminal() {
                let err = TriggerError::AlreadyRunning {
                    path: key,
                    job_id: existing.job.id,
                };
                warn!(error = %err, "trigger rejected");
                host.notify(Notice::new(NoticeKind::Rejected, "Already running", err.to_string()));
                return Err(err);
            }
        }

        let job = Job::start(planned, now);
        let launch = Launch {
            job_id: job.id,
            target: key.clone(),
            command: job.command.clone(),
        };
        info!(
            job = %job.id,
            target = %job.request.target.display(),
            kind = job.request.kind.label(),
            repo_mode = job.request.repo_mode,
            command = %job.command.display(),
            "archive job started"
        );
        host.notify(Notice::new(
            NoticeKind::Started,
            "Archive creation started",
            job.request.display_target(),
        ));

        if let Some(old) = self.interactions.insert(
            key.clone(),
            Interaction {
                job,
                filter: FilterState::default(),
            },
        ) {
            self.by_id.remove(&old.job.id);
        }
        self.by_id.insert(launch.job_id, key);
        Ok(launch)
    }

    /// Deliver a supervisor result. Events for unknown or finished jobs are
    /// dropped with a warning.
    pub fn complete(
        &mut self,
        event: CompletionEvent,
        host: &mut impl Host,
    ) -> Result<&Job, TransitionError> {
        let Some(key) = self.by_id.get(&event.job_id).cloned() else {
            warn!(job = %event.job_id, "completion for unknown job ignored");
            return Err(TransitionError::UnknownJob(event.job_id));
        };
        let Some(interaction) = self.interactions.get_mut(&key) else {
            warn!(job = %event.job_id, "completion for dismissed job ignored");
            return Err(TransitionError::UnknownJob(event.job_id));
        };
        let job = &mut interaction.job;

        if let Err(e) = job.finish(event.outcome, event.elapsed, &self.rules) {
            warn!(job = %event.job_id, error = %e, "completion ignored");
            return Err(e);
        }
        info!(
            job = %job.id,
            state = job.state().label(),
            elapsed_ms = event.elapsed.as_millis() as u64,
            "archive job finished"
        );

        announce(job, &self.ctx, &self.rules, host);
        Ok(job)
    }

    /// Apply a result-view action to the job for `key`.
    pub fn handle_intent(
        &mut self,
        key: &Path,
        intent: DialogIntent,
        host: &mut impl Host,
    ) -> Result<(), TransitionError> {
        match intent {
            DialogIntent::Dismiss => self.dismiss(key).map(|_| ()),
            DialogIntent::OpenLog => self.open_log(key, host).map(|_| ()),
            DialogIntent::CopyOutput => self.copy_output(key, host),
            DialogIntent::SetSearchTerm(term) => {
                self.interaction_mut(key)?.filter.term = term;
                Ok(())
            }
            DialogIntent::SetSeverityFilter(severity) => {
                self.interaction_mut(key)?.filter.severity = severity;
                Ok(())
            }
        }
    }

    /// Open the compilation log of a failed job. A missing file produces one
    /// `MissingLogFile` notice per call and leaves the job as it was.
    pub fn open_log(&mut self, key: &Path, host: &mut impl Host) -> Result<OpenLogOutcome, TransitionError> {
        let interaction = self.interaction(key)?;
        let JobState::Failed(report) = interaction.job.state() else {
            return Ok(OpenLogOutcome::NotOffered);
        };
        let Some(log_path) = report.log_path.clone().filter(|_| report.offers_open_log()) else {
            return Ok(OpenLogOutcome::NotOffered);
        };

        if !log_path.is_file() {
            warn!(path = %log_path.display(), "log file missing");
            host.notify(Notice::new(
                NoticeKind::MissingLogFile,
                "Log file not found",
                self.ctx.display_path(&log_path),
            ));
            return Ok(OpenLogOutcome::Missing(log_path));
        }

        if let Err(e) = host.open(&log_path) {
            warn!(path = %log_path.display(), error = %e, "could not open log");
            host.notify(Notice::new(
                NoticeKind::Rejected,
                "Could not open log",
                e.to_string(),
            ));
        }
        Ok(OpenLogOutcome::Opened(log_path))
    }

    /// Drop the job for `key`. Only finished jobs can be dismissed.
    pub fn dismiss(&mut self, key: &Path) -> Result<Job, TransitionError> {
        let job = &self.interaction(key)?.job;
        if !job.state().is_terminal() {
            return Err(TransitionError::StillRunning(job.id));
        }
        let interaction = self
            .interactions
            .remove(key)
            .ok_or_else(|| TransitionError::NoJob(key.to_path_buf()))?;
        self.by_id.remove(&interaction.job.id);
        debug!(job = %interaction.job.id, "job dismissed");
        Ok(interaction.job)
    }

    fn copy_output(&mut self, key: &Path, host: &mut impl Host) -> Result<(), TransitionError> {
        let output = self.interaction(key)?.job.output().to_string();
        match host.copy(&output) {
            Ok(()) => host.notify(Notice::new(
                NoticeKind::Info,
                "Copied",
                format!("{} bytes of output copied", output.len()),
            )),
            Err(e) => {
                warn!(error = %e, "clipboard copy failed");
                host.notify(Notice::new(NoticeKind::Rejected, "Copy failed", e.to_string()));
            }
        }
        Ok(())
    }

    pub fn job(&self, key: &Path) -> Option<&Job> {
        self.interactions.get(key).map(|i| &i.job)
    }

    pub fn snapshot(&self, key: &Path) -> JobSnapshot<'_> {
        self.job(key).map_or(JobSnapshot::Idle, Job::snapshot)
    }

    pub fn filter(&self, key: &Path) -> Option<&FilterState> {
        self.interactions.get(key).map(|i| &i.filter)
    }

    /// Visible records of a failed job under its current filter.
    pub fn view(&self, key: &Path) -> SearchView {
        match self.interactions.get(key) {
            Some(Interaction { job, filter }) => match job.state() {
                JobState::Failed(report) => search_filter(&report.records, filter),
                _ => SearchView::default(),
            },
            None => SearchView::default(),
        }
    }

    pub fn has_running(&self) -> bool {
        self.interactions
            .values()
            .any(|i| !i.job.state().is_terminal())
    }

    fn interaction(&self, key: &Path) -> Result<&Interaction, TransitionError> {
        self.interactions
            .get(key)
            .ok_or_else(|| TransitionError::NoJob(key.to_path_buf()))
    }

    fn interaction_mut(&mut self, key: &Path) -> Result<&mut Interaction, TransitionError> {
        self.interactions
            .get_mut(key)
            .ok_or_else(|| TransitionError::NoJob(key.to_path_buf()))
    }
}

/// Side effects of a terminal transition.
fn announce(job: &Job, ctx: &ContextSnapshot, rules: &RuleTable, host: &mut impl Host) {
    match job.state() {
        JobState::Running => {}
        JobState::Succeeded { summary, artifact } => {
            for path in [&job.request.target, artifact] {
                if let Err(e) = host.register(path) {
                    warn!(path = %path.display(), error = %e, "recent files registration failed");
                }
            }
            if host.current_dir().as_deref() == Some(job.request.working_dir.as_path()) {
                host.select(artifact);
            }
            let message = match classify::summary_message(summary, rules) {
                "" => ctx.display_path(artifact),
                text => text.to_string(),
            };
            host.notify(Notice::new(NoticeKind::Succeeded, "Archive created", message));
        }
        JobState::Failed(report) => {
            let errors = report.count(classify::Severity::Error);
            let warnings = report.count(classify::Severity::Warning);
            host.notify(Notice::new(
                NoticeKind::Failed,
                report.headline(&ctx.tool_name),
                format!(
                    "{}: {} error(s), {} warning(s)",
                    job.request.display_target(),
                    errors,
                    warnings
                ),
            ));
        }
        JobState::LaunchFailure { message } => {
            host.notify(Notice::new(
                NoticeKind::LaunchFailure,
                format!("Could not run {}", ctx.tool_name),
                message.clone(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RuleTableSpec;
    use crate::host::RecordingHost;
    use crate::job::supervisor::Outcome;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        board: JobBoard,
        host: RecordingHost,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let ctx = Arc::new(ContextSnapshot::fixed(
                dir.path().to_path_buf(),
                "tartex",
                Some(PathBuf::from("/usr/bin/tartex")),
            ));
            let rules = Arc::new(RuleTable::compile(&RuleTableSpec::default()).unwrap());
            let board = JobBoard::new(ctx, Arc::new(Config::default()), rules);
            Self {
                dir,
                board,
                host: RecordingHost::default(),
            }
        }

        fn file(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, "\\documentclass{article}").unwrap();
            path
        }

        fn start(&mut self, path: &Path) -> Launch {
            self.board
                .trigger(&[path.to_path_buf()], Local::now(), &mut self.host)
                .unwrap()
        }

        fn finish(&mut self, launch: &Launch, code: Option<i32>, output: &str) {
            let event = CompletionEvent {
                job_id: launch.job_id,
                outcome: Outcome::Exited {
                    code,
                    output: output.to_string(),
                },
                elapsed: Duration::from_millis(10),
            };
            self.board.complete(event, &mut self.host).unwrap();
        }
    }

    const LATEX_FAILURE: &str = "\
ERROR    Latexmk failed to compile main.tex
! Undefined control sequence.
l.12 \\foo
WARNING  bibliography not found
";

    #[test]
    fn test_second_trigger_while_running_is_rejected() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let first = fx.start(&tex);

        let err = fx
            .board
            .trigger(&[tex.clone()], Local::now(), &mut fx.host)
            .unwrap_err();
        assert_eq!(
            err,
            TriggerError::AlreadyRunning {
                path: tex.clone(),
                job_id: first.job_id
            }
        );
        assert_eq!(fx.board.job(&tex).unwrap().id, first.job_id);
        assert_eq!(fx.board.job(&tex).unwrap().state(), &JobState::Running);
        assert_eq!(fx.host.notices_of(NoticeKind::Rejected).len(), 1);
    }

    #[test]
    fn test_retrigger_after_terminal_replaces_job() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let first = fx.start(&tex);
        fx.finish(&first, Some(1), "ERROR    x\n");

        let second = fx.start(&tex);
        assert_ne!(first.job_id, second.job_id);
        assert_eq!(fx.board.job(&tex).unwrap().state(), &JobState::Running);

        // The old job id no longer resolves.
        let stale = CompletionEvent {
            job_id: first.job_id,
            outcome: Outcome::Exited {
                code: Some(0),
                output: String::new(),
            },
            elapsed: Duration::ZERO,
        };
        assert_eq!(
            fx.board.complete(stale, &mut fx.host).unwrap_err(),
            TransitionError::UnknownJob(first.job_id)
        );
    }

    #[test]
    fn test_success_registers_each_path_once_and_keeps_summary() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        fx.host.view_dir = Some(fx.dir.path().to_path_buf());
        let launch = fx.start(&tex);
        fx.finish(
            &launch,
            Some(0),
            "INFO     packing 4 files\nSummary: Saved main-rev7.tar.gz (4 files)\n",
        );

        let artifact = fx.dir.path().join("main-rev7.tar.gz");
        match fx.board.job(&tex).unwrap().state() {
            JobState::Succeeded { summary, artifact: a } => {
                assert_eq!(summary, "Summary: Saved main-rev7.tar.gz (4 files)");
                assert_eq!(a, &artifact);
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert_eq!(fx.host.registered, vec![tex.clone(), artifact.clone()]);
        assert_eq!(fx.host.selected, vec![artifact]);

        let done = fx.host.notices_of(NoticeKind::Succeeded);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].message, "Saved main-rev7.tar.gz (4 files)");
    }

    #[test]
    fn test_success_in_other_view_does_not_select() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        fx.host.view_dir = Some(PathBuf::from("/elsewhere"));
        let launch = fx.start(&tex);
        fx.finish(&launch, Some(0), "Summary: Saved main.tar.gz\n");
        assert!(fx.host.selected.is_empty());
        assert_eq!(fx.host.registered.len(), 2);
    }

    #[test]
    fn test_missing_log_notifies_once_per_attempt() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let launch = fx.start(&tex);
        fx.finish(&launch, Some(12), LATEX_FAILURE);

        let log = fx.dir.path().join("main.log");
        for attempt in 1..=2 {
            let outcome = fx.board.open_log(&tex, &mut fx.host).unwrap();
            assert_eq!(outcome, OpenLogOutcome::Missing(log.clone()));
            assert_eq!(fx.host.notices_of(NoticeKind::MissingLogFile).len(), attempt);
        }
        assert!(matches!(
            fx.board.job(&tex).unwrap().state(),
            JobState::Failed(_)
        ));
        assert!(fx.host.opened.is_empty());
    }

    #[test]
    fn test_existing_log_is_opened() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let log = fx.file("main.log");
        let launch = fx.start(&tex);
        fx.finish(&launch, Some(12), LATEX_FAILURE);

        let outcome = fx.board.open_log(&tex, &mut fx.host).unwrap();
        assert_eq!(outcome, OpenLogOutcome::Opened(log.clone()));
        assert_eq!(fx.host.opened, vec![log]);
    }

    #[test]
    fn test_open_log_not_offered_without_latex_marker() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let launch = fx.start(&tex);
        fx.finish(&launch, Some(1), "ERROR    no such file figure.png\n");
        assert_eq!(
            fx.board.open_log(&tex, &mut fx.host).unwrap(),
            OpenLogOutcome::NotOffered
        );
    }

    #[test]
    fn test_open_log_not_offered_when_latexmk_only_appears_in_chatter() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        fx.file("main.log");
        let launch = fx.start(&tex);
        fx.finish(
            &launch,
            Some(1),
            "INFO     Running latexmk on main.tex\nERROR    figure.png not found\n",
        );

        let JobState::Failed(report) = fx.board.job(&tex).unwrap().state() else {
            panic!("expected a failed job");
        };
        assert!(!report.latex_failure);
        assert!(!report.offers_open_log());
        assert_eq!(
            fx.board.open_log(&tex, &mut fx.host).unwrap(),
            OpenLogOutcome::NotOffered
        );
        assert!(fx.host.opened.is_empty());
    }

    #[test]
    fn test_failure_notice_and_filtered_view() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let launch = fx.start(&tex);
        fx.finish(&launch, Some(12), LATEX_FAILURE);

        let failed = fx.host.notices_of(NoticeKind::Failed);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].title, "tartex failed with exit code 12");

        assert_eq!(fx.board.view(&tex).len(), 4);
        fx.board
            .handle_intent(&tex, DialogIntent::SetSeverityFilter(SeverityFilter::ErrorsOnly), &mut fx.host)
            .unwrap();
        assert_eq!(fx.board.view(&tex).len(), 2);
        fx.board
            .handle_intent(&tex, DialogIntent::SetSearchTerm("UNDEFINED".to_string()), &mut fx.host)
            .unwrap();
        let view = fx.board.view(&tex);
        assert_eq!(view.len(), 1);
        assert_eq!(view.visible[0].index, 1);
    }

    #[test]
    fn test_launch_failure_notice_names_tool() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let launch = fx.start(&tex);
        let event = CompletionEvent {
            job_id: launch.job_id,
            outcome: Outcome::LaunchFailed {
                message: "/usr/bin/tartex was not found on PATH".to_string(),
            },
            elapsed: Duration::ZERO,
        };
        fx.board.complete(event, &mut fx.host).unwrap();

        let notices = fx.host.notices_of(NoticeKind::LaunchFailure);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Could not run tartex");
        assert!(fx.host.registered.is_empty());
    }

    #[test]
    fn test_dismiss_only_after_terminal_state() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let launch = fx.start(&tex);

        assert_eq!(
            fx.board.dismiss(&tex).unwrap_err(),
            TransitionError::StillRunning(launch.job_id)
        );
        fx.finish(&launch, Some(0), "Summary: ok\n");
        fx.board
            .handle_intent(&tex, DialogIntent::Dismiss, &mut fx.host)
            .unwrap();
        assert!(fx.board.job(&tex).is_none());
        assert_eq!(fx.board.snapshot(&tex), JobSnapshot::Idle);
    }

    #[test]
    fn test_copy_output_goes_to_clipboard() {
        let mut fx = Fixture::new();
        let tex = fx.file("main.tex");
        let launch = fx.start(&tex);
        fx.finish(&launch, Some(1), "ERROR    a\nplain\n");
        fx.board
            .handle_intent(&tex, DialogIntent::CopyOutput, &mut fx.host)
            .unwrap();
        assert_eq!(fx.host.copied, vec!["ERROR    a\nplain\n".to_string()]);
    }

    #[test]
    fn test_plan_errors_create_no_job() {
        let mut fx = Fixture::new();
        let pdf = fx.file("main.pdf");
        let err = fx
            .board
            .trigger(&[pdf.clone()], Local::now(), &mut fx.host)
            .unwrap_err();
        assert!(matches!(err, TriggerError::Plan(_)));
        assert!(fx.board.job(&pdf).is_none());
        assert!(fx.host.notices_of(NoticeKind::Started).is_empty());
    }
}
