//! `--no-tui`: run one job in the foreground and print the outcome.

use crate::host::{
    ActiveView, Clipboard, LogOpener, Notice, NoticeKind, Notifier, RecentFiles, RecentFilesStore,
    SystemLogOpener,
};
use crate::job::{supervisor, DialogIntent, JobBoard, JobSnapshot};
use crate::search::SeverityFilter;
use crate::util::format_elapsed;
use anyhow::Result;
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exit status when the tool could not be started (shell convention).
pub const EXIT_LAUNCH_FAILURE: i32 = 127;

/// Notices go to stderr, one line each.
pub struct HeadlessHost {
    launch_dir: PathBuf,
    recent: Option<RecentFilesStore>,
    opener: SystemLogOpener,
}

impl HeadlessHost {
    pub fn new(launch_dir: PathBuf, recent: Option<RecentFilesStore>) -> Self {
        Self {
            launch_dir,
            recent,
            opener: SystemLogOpener,
        }
    }
}

impl Notifier for HeadlessHost {
    fn notify(&mut self, notice: Notice) {
        let mark = match notice.kind {
            NoticeKind::Succeeded => "+",
            k if k.is_error() => "x",
            _ => "›",
        };
        if notice.message.is_empty() {
            eprintln!("{} {}", mark, notice.title);
        } else {
            eprintln!("{} {}: {}", mark, notice.title, notice.message);
        }
    }
}

impl RecentFiles for HeadlessHost {
    fn register(&mut self, path: &Path) -> io::Result<()> {
        match self.recent.as_mut() {
            Some(store) => store.register(path),
            None => Ok(()),
        }
    }
}

impl ActiveView for HeadlessHost {
    fn current_dir(&self) -> Option<PathBuf> {
        Some(self.launch_dir.clone())
    }

    fn select(&mut self, path: &Path) {
        debug!(path = %path.display(), "artifact lands in the launch directory");
    }
}

impl Clipboard for HeadlessHost {
    fn copy(&mut self, _text: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no clipboard in headless mode",
        ))
    }
}

impl LogOpener for HeadlessHost {
    fn open(&mut self, path: &Path) -> io::Result<()> {
        self.opener.open(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessOptions {
    pub severity: SeverityFilter,
    pub search: Option<String>,
    /// Open the compilation log when a LaTeX failure is detected.
    pub open_log: bool,
}

/// Run the job to completion and return the process exit status to use.
pub async fn run_headless(
    mut board: JobBoard,
    mut host: HeadlessHost,
    selection: &[PathBuf],
    options: HeadlessOptions,
) -> Result<i32> {
    let launch = board.trigger(selection, Local::now(), &mut host)?;
    let key = launch.target.clone();

    board.handle_intent(&key, DialogIntent::SetSeverityFilter(options.severity), &mut host)?;
    if let Some(term) = options.search.clone() {
        board.handle_intent(&key, DialogIntent::SetSearchTerm(term), &mut host)?;
    }

    let event = supervisor::run(launch.job_id, launch.command).await;
    let elapsed = event.elapsed;
    board.complete(event, &mut host)?;

    let code = match board.snapshot(&key) {
        JobSnapshot::Succeeded {
            summary, artifact, ..
        } => {
            println!("{}", summary);
            println!("{}", artifact.display());
            eprintln!("  finished in {}", format_elapsed(elapsed));
            0
        }
        JobSnapshot::Failed { report, .. } => {
            let view = board.view(&key);
            if view.is_empty() {
                eprintln!("no results");
            }
            for visible in &view.visible {
                let record = &report.records[visible.index];
                println!("{}", record.display_text());
            }
            report.exit_code.unwrap_or(1)
        }
        JobSnapshot::LaunchFailure { .. } => EXIT_LAUNCH_FAILURE,
        JobSnapshot::Idle | JobSnapshot::Running { .. } => 1,
    };

    if options.open_log {
        board.open_log(&key, &mut host)?;
    }
    Ok(code)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::classify::{RuleTable, RuleTableSpec};
    use crate::config::Config;
    use crate::context::ContextSnapshot;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn board_with_tool(dir: &TempDir, body: &str) -> JobBoard {
        let tool = dir.path().join("fake-tartex");
        fs::write(&tool, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let ctx = Arc::new(ContextSnapshot::fixed(
            dir.path().to_path_buf(),
            "tartex",
            Some(tool),
        ));
        let rules = Arc::new(RuleTable::compile(&RuleTableSpec::default()).unwrap());
        JobBoard::new(ctx, Arc::new(Config::default()), rules)
    }

    #[tokio::test]
    async fn test_success_exits_zero_and_registers_recent_files() {
        let dir = TempDir::new().unwrap();
        let tex = dir.path().join("main.tex");
        fs::write(&tex, "x").unwrap();
        let board = board_with_tool(&dir, "echo 'Summary: Saved main.tar.gz'");
        let recent_path = dir.path().join("recent.json");
        let host = HeadlessHost::new(
            dir.path().to_path_buf(),
            Some(RecentFilesStore::open(recent_path.clone(), 10)),
        );

        let code = run_headless(board, host, &[tex.clone()], HeadlessOptions::default())
            .await
            .unwrap();
        assert_eq!(code, 0);

        let store = RecentFilesStore::open(recent_path, 10);
        let paths: Vec<_> = store.entries().iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![dir.path().join("main.tar.gz"), tex]);
    }

    #[tokio::test]
    async fn test_failure_returns_tool_exit_code() {
        let dir = TempDir::new().unwrap();
        let tex = dir.path().join("main.tex");
        fs::write(&tex, "x").unwrap();
        let board = board_with_tool(&dir, "echo 'ERROR    missing fig.png'\nexit 4");
        let host = HeadlessHost::new(dir.path().to_path_buf(), None);

        let options = HeadlessOptions {
            severity: SeverityFilter::ErrorsOnly,
            ..HeadlessOptions::default()
        };
        let code = run_headless(board, host, &[tex], options).await.unwrap();
        assert_eq!(code, 4);
    }

    #[tokio::test]
    async fn test_unsupported_selection_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("main.pdf");
        fs::write(&pdf, "x").unwrap();
        let board = board_with_tool(&dir, "exit 0");
        let host = HeadlessHost::new(dir.path().to_path_buf(), None);

        let err = run_headless(board, host, &[pdf], HeadlessOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported file kind"));
    }
}
