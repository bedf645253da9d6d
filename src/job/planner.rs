//! Invocation planner
//!
//! Decides how `tartex` is called for a selection: which flags, which output
//! name, which working directory. Planning touches the filesystem only to
//! stat the target and to look for an enclosing git repository.

use super::request::{JobRequest, TargetKind};
use crate::classify::RuleTable;
use crate::config::Config;
use crate::context::ContextSnapshot;
use crate::error::PlanError;
use chrono::{DateTime, Local};
use git2::Repository;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Terminal width the tool is told to format for.
pub const TOOL_COLUMNS: &str = "132";

const OUTPUT_FLAG: &str = "--output";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Set for the child only.
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl ToolCommand {
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value following `flag`, if present.
    pub fn arg_value(&self, flag: &str) -> Option<&OsString> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1)
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Where the tarball is expected to land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactTarget {
    /// Name chosen here and passed with `--output`.
    Named { name: String, path: PathBuf },
    /// The tool picks the name; `fallback` is used when its summary does not
    /// mention one.
    ToolDefault { fallback: PathBuf },
}

impl ArtifactTarget {
    /// Resolve the produced artifact from the tool's summary line.
    pub fn resolve(&self, summary: Option<&str>, working_dir: &Path, rules: &RuleTable) -> PathBuf {
        match self {
            ArtifactTarget::Named { path, .. } => path.clone(),
            ArtifactTarget::ToolDefault { fallback } => summary
                .and_then(|s| rules.find_artifact(s))
                .map(|found| working_dir.join(found))
                .unwrap_or_else(|| fallback.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannedInvocation {
    pub request: JobRequest,
    pub command: ToolCommand,
    pub artifact: ArtifactTarget,
}

/// Plan a `tartex` run for `selection`.
///
/// Exactly one regular `.tex` or `.fls` file is accepted. Relative paths are
/// taken relative to the launch directory.
pub fn plan(
    selection: &[PathBuf],
    ctx: &Arc<ContextSnapshot>,
    config: &Config,
    now: DateTime<Local>,
) -> Result<PlannedInvocation, PlanError> {
    let selected = match selection {
        [] => return Err(PlanError::EmptySelection),
        [one] => one,
        many => return Err(PlanError::MultipleSelection(many.len())),
    };

    let target = if selected.is_absolute() {
        selected.clone()
    } else {
        ctx.launch_dir.join(selected)
    };

    if !target.is_file() {
        return Err(PlanError::NotAFile(target));
    }

    let kind = TargetKind::from_path(&target)
        .ok_or_else(|| PlanError::UnsupportedFileKind(target.clone()))?;

    let working_dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| PlanError::NoParentDirectory(target.clone()))?;

    let repo_mode = match kind {
        TargetKind::TexSource => in_repository(&working_dir),
        TargetKind::FlsRecord => false,
    };

    let request = JobRequest {
        target,
        kind,
        working_dir,
        repo_mode,
        ctx: Arc::clone(ctx),
    };

    let mut args: Vec<OsString> = vec![request.target.clone().into_os_string()];
    args.extend(config.base_args.iter().map(OsString::from));

    let stem = request.stem();
    let artifact = match kind {
        TargetKind::FlsRecord => {
            let base = format!("{}-{}", stem, now.format(TIMESTAMP_FORMAT));
            let (name, path) =
                unused_archive_name(&request.working_dir, &base, &config.archive_extension);
            args.push(OUTPUT_FLAG.into());
            args.push(path.clone().into_os_string());
            ArtifactTarget::Named { name, path }
        }
        TargetKind::TexSource => {
            if repo_mode {
                args.extend(config.repo_args.iter().map(OsString::from));
                // Directory only, so the tool still names the tarball after the git revision.
                args.push(OUTPUT_FLAG.into());
                args.push(request.working_dir.clone().into_os_string());
            }
            ArtifactTarget::ToolDefault {
                fallback: request
                    .working_dir
                    .join(format!("{}.{}", stem, config.archive_extension)),
            }
        }
    };

    let command = ToolCommand {
        program: ctx.tool_program(),
        args,
        env: vec![
            ("COLUMNS".to_string(), TOOL_COLUMNS.to_string()),
            ("TERM".to_string(), "dumb".to_string()),
        ],
        cwd: request.working_dir.clone(),
    };

    Ok(PlannedInvocation {
        request,
        command,
        artifact,
    })
}

/// `dir` or one of its ancestors is inside a git work tree.
pub fn in_repository(dir: &Path) -> bool {
    Repository::discover(dir).is_ok()
}

/// `<base>.<ext>`, or `<base>-N.<ext>` when a run within the same second
/// already wrote that tarball.
fn unused_archive_name(dir: &Path, base: &str, ext: &str) -> (String, PathBuf) {
    let mut name = base.to_string();
    let mut n = 1;
    loop {
        let path = dir.join(format!("{}.{}", name, ext));
        if !path.exists() {
            return (name, path);
        }
        name = format!("{}-{}", base, n);
        n += 1;
    }
}
