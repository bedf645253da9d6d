use crate::context::ContextSnapshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What kind of file the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A `.tex` source; the tool decides whether to recompile.
    TexSource,
    /// A `.fls` recorder file; its listed inputs are packaged as-is.
    FlsRecord,
}

impl TargetKind {
    /// Case-insensitive extension lookup.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "tex" => Some(TargetKind::TexSource),
            "fls" => Some(TargetKind::FlsRecord),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::TexSource => "LaTeX source",
            TargetKind::FlsRecord => "recorder file",
        }
    }
}

/// Immutable description of one trigger.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub target: PathBuf,
    pub kind: TargetKind,
    pub working_dir: PathBuf,
    /// A git repository contains the working directory. Always `false` for
    /// [`TargetKind::FlsRecord`], where detection is skipped.
    pub repo_mode: bool,
    pub ctx: Arc<ContextSnapshot>,
}

impl JobRequest {
    /// File name without extension, used for artifact and log names.
    pub fn stem(&self) -> String {
        self.target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string())
    }

    pub fn display_target(&self) -> String {
        self.ctx.display_path(&self.target)
    }
}
