//! Collaborators outside the job board
//!
//! The board never talks to the terminal, the clipboard or the filesystem
//! registry directly. It goes through these traits, so the TUI, the headless
//! runner and the tests each plug in their own implementations.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Started,
    Succeeded,
    Failed,
    LaunchFailure,
    MissingLogFile,
    /// A trigger or intent was refused.
    Rejected,
    Info,
}

impl NoticeKind {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            NoticeKind::Failed
                | NoticeKind::LaunchFailure
                | NoticeKind::MissingLogFile
                | NoticeKind::Rejected
        )
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

pub trait RecentFiles {
    fn register(&mut self, path: &Path) -> io::Result<()>;
}

/// The directory the user is currently looking at.
pub trait ActiveView {
    fn current_dir(&self) -> Option<PathBuf>;
    fn select(&mut self, path: &Path);
}

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()>;
}

pub trait LogOpener {
    fn open(&mut self, path: &Path) -> io::Result<()>;
}

/// Everything the job board needs from its surroundings.
pub trait Host: Notifier + RecentFiles + ActiveView + Clipboard + LogOpener {}

impl<T: Notifier + RecentFiles + ActiveView + Clipboard + LogOpener> Host for T {}

// ═══════════════════════════════════════════════════════════════════════════
//  RECENT FILES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub path: PathBuf,
    pub registered_at: DateTime<Local>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecentFilesFile {
    #[serde(default)]
    entries: Vec<RecentEntry>,
}

/// Recent-files registry persisted as JSON, newest first.
#[derive(Debug, Clone)]
pub struct RecentFilesStore {
    path: PathBuf,
    limit: usize,
    entries: Vec<RecentEntry>,
}

impl RecentFilesStore {
    /// `<data dir>/tartex-runner/recent.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(crate::APP_NAME).join("recent.json"))
    }

    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf, limit: usize) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<RecentFilesFile>(&content) {
                Ok(file) => file.entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "recent files list is corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            path,
            limit: limit.max(1),
            entries,
        }
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    fn save(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = RecentFilesFile {
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(io::Error::other)?;
        write_atomic(&self.path, &content)
    }
}

impl RecentFiles for RecentFilesStore {
    fn register(&mut self, path: &Path) -> io::Result<()> {
        self.entries.retain(|e| e.path != path);
        self.entries.insert(
            0,
            RecentEntry {
                path: path.to_path_buf(),
                registered_at: Local::now(),
            },
        );
        self.entries.truncate(self.limit);
        self.save()
    }
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLIPBOARD
// ═══════════════════════════════════════════════════════════════════════════

/// Copies through the terminal with an OSC 52 escape sequence, which works
/// over SSH and inside tmux (with `set-clipboard on`).
#[derive(Debug, Default)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    pub fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", BASE64.encode(text.as_bytes()))
    }
}

impl Clipboard for Osc52Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout();
        out.write_all(Self::sequence(text).as_bytes())?;
        out.flush()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOG OPENER
// ═══════════════════════════════════════════════════════════════════════════

/// Opens files with the desktop's default handler.
#[derive(Debug, Default)]
pub struct SystemLogOpener;

impl LogOpener for SystemLogOpener {
    fn open(&mut self, path: &Path) -> io::Result<()> {
        debug!(path = %path.display(), "opening log");

        #[cfg(target_os = "macos")]
        {
            Command::new("open").arg(path).spawn()?;
        }

        #[cfg(target_os = "windows")]
        {
            Command::new("cmd")
                .args(["/C", "start", ""])
                .arg(path)
                .spawn()?;
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Command::new("xdg-open").arg(path).spawn()?;
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TEST DOUBLE
// ═══════════════════════════════════════════════════════════════════════════

/// Records every call, for board tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub notices: Vec<Notice>,
    pub registered: Vec<PathBuf>,
    pub view_dir: Option<PathBuf>,
    pub selected: Vec<PathBuf>,
    pub copied: Vec<String>,
    pub opened: Vec<PathBuf>,
}

#[cfg(test)]
impl RecordingHost {
    pub fn notices_of(&self, kind: NoticeKind) -> Vec<&Notice> {
        self.notices.iter().filter(|n| n.kind == kind).collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingHost {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[cfg(test)]
impl RecentFiles for RecordingHost {
    fn register(&mut self, path: &Path) -> io::Result<()> {
        self.registered.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
impl ActiveView for RecordingHost {
    fn current_dir(&self) -> Option<PathBuf> {
        self.view_dir.clone()
    }

    fn select(&mut self, path: &Path) {
        self.selected.push(path.to_path_buf());
    }
}

#[cfg(test)]
impl Clipboard for RecordingHost {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        self.copied.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
impl LogOpener for RecordingHost {
    fn open(&mut self, path: &Path) -> io::Result<()> {
        self.opened.push(path.to_path_buf());
        Ok(())
    }
}
