//! Configuration management for tartex-runner
//!
//! Stores settings in ~/.config/tartex-runner/config.json. Every field has a
//! default, so a partial file (or none at all) is fine.

use crate::classify::{RuleTable, RuleTableSpec};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tool name or path.
    pub tool: String,
    /// Always passed after the target (`-b` bundles the .bbl, `-s` prints a summary).
    pub base_args: Vec<String>,
    /// Added for .tex targets inside a git repository.
    pub repo_args: Vec<String>,
    /// Extension for tarballs named by the runner.
    pub archive_extension: String,
    pub recent_files_limit: usize,
    /// Tracing filter, e.g. `debug` or `tartex_runner=trace`. `RUST_LOG` wins.
    pub log_level: Option<String>,
    pub rules: RuleTableSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: "tartex".to_string(),
            base_args: vec!["-b".to_string(), "-s".to_string()],
            repo_args: vec!["--git-rev".to_string(), "--overwrite".to_string()],
            archive_extension: "tar.gz".to_string(),
            recent_files_limit: 50,
            log_level: None,
            rules: RuleTableSpec::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(crate::APP_NAME))
    }

    /// Get the config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load from `path`, or from the default location.
    ///
    /// A missing file gives defaults. A file that does not parse is moved
    /// aside to `config.json.corrupt` and the parse error is returned, so the
    /// caller can warn and continue with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::ReadFile { path, source }),
        };

        let config: Config = serde_json::from_str(&content).map_err(|err| {
            preserve_corrupt_config(&path, &content);
            ConfigError::from(err)
        })?;
        // Surface bad patterns at load time rather than on the first failure.
        config.compile_rules()?;
        Ok(config)
    }

    pub fn compile_rules(&self) -> Result<RuleTable, ConfigError> {
        RuleTable::compile(&self.rules)
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
