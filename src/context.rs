//! Process identity captured once at startup
//!
//! Everything that used to be looked up ad hoc (home directory, the tool's
//! location on PATH, the launching directory) lives in one immutable
//! snapshot shared as `Arc<ContextSnapshot>`.

use chrono::{DateTime, Local};
use std::env;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    pub session_id: Uuid,
    pub pid: u32,
    pub user: Option<String>,
    pub home_dir: Option<PathBuf>,
    /// Directory the runner was started from; the initial active view.
    pub launch_dir: PathBuf,
    /// Tool name as configured (e.g. `tartex`).
    pub tool_name: String,
    /// Absolute tool path if it was found on PATH at startup.
    pub tool_path: Option<PathBuf>,
    pub captured_at: DateTime<Local>,
}

impl ContextSnapshot {
    /// Capture the snapshot. Call exactly once per process.
    pub fn capture(tool_name: &str) -> std::io::Result<Self> {
        let launch_dir = env::current_dir()?;
        Ok(Self {
            session_id: Uuid::new_v4(),
            pid: std::process::id(),
            user: env::var("USER").or_else(|_| env::var("USERNAME")).ok(),
            home_dir: dirs::home_dir(),
            launch_dir,
            tool_name: tool_name.to_string(),
            tool_path: resolve_on_path(tool_name),
            captured_at: Local::now(),
        })
    }

    /// Build a snapshot from explicit parts (tests, embedding hosts).
    pub fn fixed(launch_dir: PathBuf, tool_name: &str, tool_path: Option<PathBuf>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            pid: std::process::id(),
            user: None,
            home_dir: None,
            launch_dir,
            tool_name: tool_name.to_string(),
            tool_path,
            captured_at: Local::now(),
        }
    }

    /// The program to execute: the resolved path, or the bare name so the
    /// spawn itself reports the lookup failure.
    pub fn tool_program(&self) -> PathBuf {
        self.tool_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.tool_name))
    }

    /// Display a path relative to the home directory (`~/...`) when possible.
    pub fn display_path(&self, path: &Path) -> String {
        if let Some(home) = &self.home_dir {
            if let Ok(rel) = path.strip_prefix(home) {
                return format!("~{}{}", std::path::MAIN_SEPARATOR, rel.display());
            }
        }
        path.display().to_string()
    }
}

/// Look a program up on PATH. Names containing a separator are checked as-is.
pub fn resolve_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
        .find(|full| is_executable(full))
}

#[cfg(windows)]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    ["", ".exe", ".bat", ".cmd"]
        .into_iter()
        .map(move |ext| format!("{}{}", program, ext))
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(program.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_uses_tilde_under_home() {
        let mut ctx = ContextSnapshot::fixed(PathBuf::from("/tmp"), "tartex", None);
        ctx.home_dir = Some(PathBuf::from("/home/ada"));
        let shown = ctx.display_path(Path::new("/home/ada/thesis/main.tex"));
        assert_eq!(
            shown,
            format!("~{}thesis/main.tex", std::path::MAIN_SEPARATOR)
        );
        assert_eq!(ctx.display_path(Path::new("/srv/x.tex")), "/srv/x.tex");
    }

    #[test]
    fn test_capture_records_process_identity() {
        let before = Local::now();
        let ctx = ContextSnapshot::capture("definitely-not-a-real-tool-4f1c").unwrap();
        assert_eq!(ctx.pid, std::process::id());
        assert_eq!(ctx.launch_dir, env::current_dir().unwrap());
        assert!(ctx.captured_at >= before);
        assert!(ctx.tool_path.is_none());

        let other = ContextSnapshot::capture("definitely-not-a-real-tool-4f1c").unwrap();
        assert_ne!(ctx.session_id, other.session_id);
    }

    #[test]
    fn test_tool_program_falls_back_to_name() {
        let ctx = ContextSnapshot::fixed(PathBuf::from("/tmp"), "tartex", None);
        assert_eq!(ctx.tool_program(), PathBuf::from("tartex"));
    }

    #[test]
    fn test_resolve_on_path_misses_unknown_program() {
        assert!(resolve_on_path("definitely-not-a-real-tool-4f1c").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_on_path_accepts_explicit_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-tartex");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(resolve_on_path(tool.to_str().unwrap()), Some(tool));
    }
}
