//! Classification rule table
//!
//! The table is data, not code: every marker the classifier looks for comes
//! from a [`RuleTableSpec`] that users can override in the config file when
//! the tool's wording changes.

use super::{Origin, Severity};
use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One severity rule as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    pub severity: Severity,
    #[serde(default)]
    pub origin: Option<Origin>,
    /// Only applies when LaTeX log content is interleaved in the output.
    #[serde(default)]
    pub log_context: bool,
}

impl RuleSpec {
    fn new(
        name: &str,
        pattern: &str,
        severity: Severity,
        origin: Origin,
        log_context: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            severity,
            origin: Some(origin),
            log_context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTableSpec {
    /// Ordered; first match wins.
    pub rules: Vec<RuleSpec>,
    /// Matched against tool error lines only; a hit marks the failure as
    /// coming from the LaTeX compilation step.
    pub latex_failure_markers: Vec<String>,
    /// Must contain a `path` capture group.
    pub log_path_pattern: String,
    /// Must contain a `path` capture group.
    pub artifact_pattern: String,
    /// Label the tool puts in front of its final status line.
    pub summary_label: String,
}

impl Default for RuleTableSpec {
    fn default() -> Self {
        Self {
            rules: vec![
                RuleSpec::new(
                    "tool_error",
                    r"^\s*(?:ERROR|CRITICAL)\b",
                    Severity::Error,
                    Origin::Tool,
                    false,
                ),
                RuleSpec::new(
                    "tool_warning",
                    r"^\s*WARNING\b",
                    Severity::Warning,
                    Origin::Tool,
                    false,
                ),
                RuleSpec::new("latex_error", r"^! ", Severity::Error, Origin::LatexLog, true),
                RuleSpec::new(
                    "file_line_error",
                    r"^\S+\.(?:tex|sty|cls|bib|bst):(?P<line>\d+):",
                    Severity::Error,
                    Origin::LatexLog,
                    true,
                ),
                RuleSpec::new(
                    "latex_warning",
                    r"(?:LaTeX|Package \S+|Class \S+) Warning:(?:.*input line (?P<line>\d+))?",
                    Severity::Warning,
                    Origin::LatexLog,
                    true,
                ),
                RuleSpec::new(
                    "box_warning",
                    r"^(?:Overfull|Underfull) \\[hv]box",
                    Severity::Warning,
                    Origin::LatexLog,
                    true,
                ),
                RuleSpec::new(
                    "latex_context",
                    r"^l\.(?P<line>\d+)\b",
                    Severity::Info,
                    Origin::LatexLog,
                    true,
                ),
            ],
            latex_failure_markers: vec![r"(?i)\blatexmk\b".to_string()],
            log_path_pattern: r#"(?P<path>[^\s'"()\[\]<>]+\.log)\b"#.to_string(),
            artifact_pattern: r#"(?P<path>[^\s'"()\[\]<>]+\.tar(?:\.(?:gz|bz2|xz|zst))?)\b"#
                .to_string(),
            summary_label: "Summary:".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) name: String,
    regex: Regex,
    pub(crate) severity: Severity,
    pub(crate) origin: Option<Origin>,
    log_context: bool,
}

/// Result of matching one line against the table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleHit<'a> {
    pub(crate) rule: &'a CompiledRule,
    pub(crate) log_line: Option<u32>,
}

/// Compiled form of [`RuleTableSpec`].
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
    latex_markers: Vec<Regex>,
    log_path: Regex,
    artifact: Regex,
    summary_label: String,
}

impl RuleTable {
    pub fn compile(spec: &RuleTableSpec) -> Result<Self, ConfigError> {
        let rules = spec
            .rules
            .iter()
            .map(|r| {
                Ok(CompiledRule {
                    name: r.name.clone(),
                    regex: compile_pattern(&r.name, &r.pattern)?,
                    severity: r.severity,
                    origin: r.origin,
                    log_context: r.log_context,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let latex_markers = spec
            .latex_failure_markers
            .iter()
            .enumerate()
            .map(|(i, p)| compile_pattern(&format!("latex_failure_markers[{}]", i), p))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            rules,
            latex_markers,
            log_path: compile_pattern("log_path_pattern", &spec.log_path_pattern)?,
            artifact: compile_pattern("artifact_pattern", &spec.artifact_pattern)?,
            summary_label: spec.summary_label.clone(),
        })
    }

    /// First rule matching `line`. Log-context rules are skipped unless
    /// `log_context` is set.
    pub(crate) fn match_line(&self, line: &str, log_context: bool) -> Option<RuleHit<'_>> {
        self.rules
            .iter()
            .filter(|rule| log_context || !rule.log_context)
            .find_map(|rule| {
                rule.regex.captures(line).map(|caps| RuleHit {
                    rule,
                    log_line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
                })
            })
    }

    /// A tool-level error line that names the LaTeX step. Markers in
    /// progress chatter (`INFO     Running latexmk ...`) do not count.
    pub fn is_latex_failure_line(&self, line: &str) -> bool {
        let tool_error = self
            .match_line(line, false)
            .is_some_and(|hit| hit.rule.severity == Severity::Error);
        tool_error && self.latex_markers.iter().any(|re| re.is_match(line))
    }

    /// Last log path mentioned in `text`.
    pub fn find_log_path<'t>(&self, text: &'t str) -> Option<&'t str> {
        last_path_capture(&self.log_path, text)
    }

    /// Last tarball path mentioned in `text`.
    pub fn find_artifact<'t>(&self, text: &'t str) -> Option<&'t str> {
        last_path_capture(&self.artifact, text)
    }

    pub fn summary_label(&self) -> &str {
        &self.summary_label
    }
}

fn compile_pattern(name: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        name: name.to_string(),
        source,
    })
}

fn last_path_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures_iter(text)
        .filter_map(|caps| caps.name("path"))
        .last()
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::compile(&RuleTableSpec::default()).unwrap()
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let t = table();
        // Matches both tool_error and the latexmk marker; severity comes from the rule.
        let hit = t.match_line("ERROR    Latexmk failed", false).unwrap();
        assert_eq!(hit.rule.name, "tool_error");
        assert_eq!(hit.rule.severity, Severity::Error);
    }

    #[test]
    fn test_latex_marker_only_counts_on_tool_errors() {
        let t = table();
        assert!(t.is_latex_failure_line("ERROR    Latexmk failed to compile main.tex"));
        assert!(!t.is_latex_failure_line("INFO     Running latexmk on main.tex"));
        assert!(!t.is_latex_failure_line("WARNING  latexmk printed warnings"));
        assert!(!t.is_latex_failure_line("ERROR    figure.png not found"));
    }

    #[test]
    fn test_log_context_rules_are_gated() {
        let t = table();
        assert!(t.match_line("! Undefined control sequence.\n", false).is_none());
        let hit = t.match_line("! Undefined control sequence.\n", true).unwrap();
        assert_eq!(hit.rule.origin, Some(Origin::LatexLog));
    }

    #[test]
    fn test_line_numbers_are_captured() {
        let t = table();
        let hit = t.match_line("./chapter1.tex:42: Missing $ inserted.", true).unwrap();
        assert_eq!(hit.rule.name, "file_line_error");
        assert_eq!(hit.log_line, Some(42));

        let warn = t
            .match_line(
                "LaTeX Warning: Reference `fig:a' on page 3 undefined on input line 118.",
                true,
            )
            .unwrap();
        assert_eq!(warn.rule.severity, Severity::Warning);
        assert_eq!(warn.log_line, Some(118));

        let ctx = t.match_line("l.7 \\foo", true).unwrap();
        assert_eq!(ctx.rule.severity, Severity::Info);
        assert_eq!(ctx.log_line, Some(7));
    }

    #[test]
    fn test_find_log_path_takes_last_mention() {
        let t = table();
        let text = "see build/a.log\nERROR    compile failed, log: /tmp/tartex/main.log\n";
        assert_eq!(t.find_log_path(text), Some("/tmp/tartex/main.log"));
        assert_eq!(t.find_log_path("nothing here"), None);
    }

    #[test]
    fn test_find_artifact_in_summary() {
        let t = table();
        let line = "Summary: Saved paper.tar.gz (12 files, 34.1 KiB)";
        assert_eq!(t.find_artifact(line), Some("paper.tar.gz"));
        assert_eq!(t.find_artifact("Summary: out/x.tar"), Some("out/x.tar"));
    }

    #[test]
    fn test_invalid_pattern_is_reported_by_name() {
        let mut spec = RuleTableSpec::default();
        spec.rules[0].pattern = "(unclosed".to_string();
        match RuleTable::compile(&spec) {
            Err(ConfigError::InvalidPattern { name, .. }) => assert_eq!(name, "tool_error"),
            other => panic!("expected InvalidPattern, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_rules_round_trip_through_json_with_defaults() {
        let spec: RuleTableSpec =
            serde_json::from_str(r#"{"summary_label": "Done:"}"#).unwrap();
        assert_eq!(spec.summary_label, "Done:");
        assert_eq!(spec.rules, RuleTableSpec::default().rules);
    }
}
