//! tartex-runner UI
//!
//! Layout:
//! ╔══════════════════════════════════════════════════════════════╗
//! ║  t a r t e x   ~/thesis/main.tex · failed                    ║
//! ╠══════════════════════════════════════════════════════════════╣
//! ║  tartex failed with exit code 12                             ║
//! ║  ✗ ERROR    Latexmk failed to compile main.tex               ║
//! ║  ✗ ! Undefined control sequence.                             ║
//! ║  · l.12 \foo                                                 ║
//! ╠══════════════════════════════════════════════════════════════╣
//! ║  2 errors · 1 warning │ / search  e errors  l log  q quit    ║
//! ╚══════════════════════════════════════════════════════════════╝

pub mod helpers;
pub mod render;
pub mod theme;

pub use render::render;

use crate::host::{
    ActiveView, Clipboard, LogOpener, Notice, NoticeKind, Notifier, Osc52Clipboard, RecentFiles,
    RecentFilesStore, SystemLogOpener,
};
use crate::job::{DialogIntent, JobBoard, JobSnapshot};
use crate::search::SeverityFilter;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

/// Toast notification kind - affects duration and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

impl ToastKind {
    /// Duration in seconds before toast expires
    pub fn duration_secs(&self) -> u64 {
        match self {
            ToastKind::Info => 3,
            ToastKind::Success => 5,
            ToastKind::Error => 10, // Errors stay longer
        }
    }
}

/// Toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub created_at: Instant,
    pub kind: ToastKind,
}

impl Toast {
    pub fn from_notice(notice: &Notice) -> Self {
        let kind = match notice.kind {
            NoticeKind::Succeeded => ToastKind::Success,
            k if k.is_error() => ToastKind::Error,
            _ => ToastKind::Info,
        };
        let message = if notice.message.is_empty() {
            notice.title.clone()
        } else {
            format!("{}: {}", notice.title, notice.message)
        };
        Self {
            message,
            created_at: Instant::now(),
            kind,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed().as_secs() >= self.kind.duration_secs()
    }
}

/// The host side of the board while running inside the terminal.
pub struct TuiHost {
    pub toast: Option<Toast>,
    /// Directory the UI is "browsing"; starts at the launch directory.
    pub browse_dir: PathBuf,
    /// Path the last success selected in the view.
    pub highlighted: Option<PathBuf>,
    recent: Option<RecentFilesStore>,
    clipboard: Osc52Clipboard,
    opener: SystemLogOpener,
}

impl TuiHost {
    pub fn new(browse_dir: PathBuf, recent: Option<RecentFilesStore>) -> Self {
        Self {
            toast: None,
            browse_dir,
            highlighted: None,
            recent,
            clipboard: Osc52Clipboard,
            opener: SystemLogOpener,
        }
    }
}

impl Notifier for TuiHost {
    fn notify(&mut self, notice: Notice) {
        self.toast = Some(Toast::from_notice(&notice));
    }
}

impl RecentFiles for TuiHost {
    fn register(&mut self, path: &Path) -> io::Result<()> {
        match self.recent.as_mut() {
            Some(store) => store.register(path),
            None => Ok(()),
        }
    }
}

impl ActiveView for TuiHost {
    fn current_dir(&self) -> Option<PathBuf> {
        Some(self.browse_dir.clone())
    }

    fn select(&mut self, path: &Path) {
        self.highlighted = Some(path.to_path_buf());
    }
}

impl Clipboard for TuiHost {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        self.clipboard.copy(text)
    }
}

impl LogOpener for TuiHost {
    fn open(&mut self, path: &Path) -> io::Result<()> {
        self.opener.open(path)
    }
}

/// Main application state
pub struct App {
    pub board: JobBoard,
    pub host: TuiHost,
    /// Paths given on the command line; re-run uses them again.
    pub selection: Vec<PathBuf>,
    /// Target of the current interaction, once a trigger succeeded.
    pub target: Option<PathBuf>,
    pub input_mode: InputMode,
    /// Search text being edited; pushed to the board on every keystroke.
    pub search_input: String,
    pub scroll: usize,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(board: JobBoard, host: TuiHost, selection: Vec<PathBuf>) -> Self {
        Self {
            board,
            host,
            selection,
            target: None,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            scroll: 0,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot<'_> {
        match &self.target {
            Some(target) => self.board.snapshot(target),
            None => JobSnapshot::Idle,
        }
    }

    pub fn severity_filter(&self) -> SeverityFilter {
        self.target
            .as_deref()
            .and_then(|t| self.board.filter(t))
            .map(|f| f.severity)
            .unwrap_or_default()
    }

    /// Send an intent for the current interaction; errors become toasts.
    pub fn intent(&mut self, intent: DialogIntent) {
        let Some(target) = self.target.clone() else {
            return;
        };
        if let Err(e) = self.board.handle_intent(&target, intent, &mut self.host) {
            warn!(error = %e, "intent refused");
            self.show_toast(&e.to_string(), ToastKind::Error);
        }
    }

    /// Tick the spinner while a job runs
    pub fn tick(&mut self) {
        if matches!(self.snapshot(), JobSnapshot::Running { .. }) {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn show_toast(&mut self, message: &str, kind: ToastKind) {
        self.host.toast = Some(Toast {
            message: message.to_string(),
            created_at: Instant::now(),
            kind,
        });
    }

    /// Clear expired toast
    pub fn clear_expired_toast(&mut self) {
        if self.host.toast.as_ref().is_some_and(Toast::is_expired) {
            self.host.toast = None;
        }
    }

    /// Enter search mode
    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.search_input = self
            .target
            .as_deref()
            .and_then(|t| self.board.filter(t))
            .map(|f| f.term.clone())
            .unwrap_or_default();
    }

    /// Leave search mode keeping the term
    pub fn accept_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Exit search mode and clear the term
    pub fn exit_search(&mut self) {
        self.input_mode = InputMode::Normal;
        self.search_input.clear();
        self.apply_search();
    }

    /// Add character to search query
    pub fn search_push(&mut self, c: char) {
        self.search_input.push(c);
        self.apply_search();
    }

    /// Remove last character from search query
    pub fn search_pop(&mut self) {
        self.search_input.pop();
        self.apply_search();
    }

    fn apply_search(&mut self) {
        self.scroll = 0;
        self.intent(DialogIntent::SetSearchTerm(self.search_input.clone()));
    }

    pub fn set_severity(&mut self, severity: SeverityFilter) {
        self.scroll = 0;
        self.intent(DialogIntent::SetSeverityFilter(severity));
    }

    /// Number of rows the body can scroll through.
    pub fn row_count(&self) -> usize {
        match (&self.target, self.snapshot()) {
            (Some(target), JobSnapshot::Failed { .. }) => self.board.view(target).len(),
            _ => 0,
        }
    }

    pub fn scroll_down(&mut self, by: usize) {
        let max = self.row_count().saturating_sub(1);
        self.scroll = (self.scroll + by).min(max);
    }

    pub fn scroll_up(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_sub(by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_kind_follows_notice() {
        let ok = Toast::from_notice(&Notice::new(NoticeKind::Succeeded, "Archive created", "Saved x"));
        assert_eq!(ok.kind, ToastKind::Success);
        assert_eq!(ok.message, "Archive created: Saved x");

        let missing = Toast::from_notice(&Notice::new(NoticeKind::MissingLogFile, "Log file not found", ""));
        assert_eq!(missing.kind, ToastKind::Error);
        assert_eq!(missing.message, "Log file not found");

        let started = Toast::from_notice(&Notice::new(NoticeKind::Started, "Archive creation started", "a.tex"));
        assert_eq!(started.kind, ToastKind::Info);
        assert!(!started.is_expired());
    }
}
