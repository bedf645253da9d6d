//! Output classifier
//!
//! Turns the tool's combined output into one [`DiagnosticRecord`] per
//! physical line. Nothing is dropped, merged or reordered: concatenating
//! the record texts gives back the captured output byte for byte.

pub mod rules;

pub use rules::{RuleSpec, RuleTable, RuleTableSpec};

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Where a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The packaging tool's own message.
    Tool,
    /// A message re-surfaced from the LaTeX compilation log.
    LatexLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// The line exactly as captured, terminator included.
    pub text: String,
    pub severity: Severity,
    /// Line number in the external log, when the marker carries one.
    pub log_line: Option<u32>,
    pub origin: Option<Origin>,
}

impl DiagnosticRecord {
    /// Text without the trailing line terminator.
    pub fn display_text(&self) -> &str {
        self.text.trim_end_matches(['\n', '\r'])
    }
}

/// Everything the classifier learned from one run's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedOutput {
    pub records: Vec<DiagnosticRecord>,
    /// Some line matched a LaTeX-compilation failure marker.
    pub latex_failure: bool,
    /// LaTeX-log rules were active for this output.
    pub log_context: bool,
}

impl ClassifiedOutput {
    pub fn count(&self, severity: Severity) -> usize {
        self.records.iter().filter(|r| r.severity == severity).count()
    }
}

/// Classify `text` line by line.
///
/// `log_hint` is the compilation log path reported by the tool, if any. Its
/// presence (or any LaTeX-failure marker in the text) switches on the
/// LaTeX-log rules.
pub fn classify(text: &str, log_hint: Option<&Path>, rules: &RuleTable) -> ClassifiedOutput {
    let latex_failure = text.lines().any(|line| rules.is_latex_failure_line(line));
    let log_context = log_hint.is_some() || latex_failure;

    let records = text
        .split_inclusive('\n')
        .map(|line| match rules.match_line(line, log_context) {
            Some(hit) => DiagnosticRecord {
                text: line.to_string(),
                severity: hit.rule.severity,
                log_line: hit.log_line,
                origin: hit.rule.origin,
            },
            None => DiagnosticRecord {
                text: line.to_string(),
                severity: Severity::Info,
                log_line: None,
                origin: None,
            },
        })
        .collect();

    ClassifiedOutput {
        records,
        latex_failure,
        log_context,
    }
}

/// The tool's final status line: the last line carrying the summary label,
/// or failing that the last non-empty line. Returned verbatim, without its
/// line terminator.
pub fn summary_line<'t>(text: &'t str, rules: &RuleTable) -> Option<&'t str> {
    let label = rules.summary_label();
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));
    let labelled = if label.is_empty() {
        None
    } else {
        text.lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| l.trim_start().starts_with(label))
            .last()
    };
    labelled.or_else(|| lines.rfind(|l| !l.trim().is_empty()))
}

/// Strip the summary label for display (`Summary: Saved x` → `Saved x`).
pub fn summary_message<'s>(summary: &'s str, rules: &RuleTable) -> &'s str {
    let label = rules.summary_label();
    let trimmed = summary.trim_start();
    if !label.is_empty() {
        if let Some(rest) = trimmed.strip_prefix(label) {
            return rest.trim_start();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn table() -> RuleTable {
        RuleTable::compile(&RuleTableSpec::default()).unwrap()
    }

    fn concat(records: &[DiagnosticRecord]) -> String {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_round_trip_reproduces_output() {
        let samples = [
            "",
            "single line without newline",
            "a\nb\n",
            "ERROR    x\r\n\n\nWARNING y\nlast",
            "Latexmk: Errors\n! Undefined control sequence.\nl.12 \\foo\n",
            "ünïcödé ✓\n\tindented\n",
        ];
        for sample in samples {
            let out = classify(sample, None, &table());
            assert_eq!(concat(&out.records), sample);
        }
    }

    #[test]
    fn test_counts_three_errors_two_warnings_five_plain() {
        let text = "\
INFO     collecting inputs
ERROR    missing figure fig1.pdf
plain line one
WARNING  bibliography is stale
ERROR    missing figure fig2.pdf
plain line two
plain line three
CRITICAL aborting
WARNING  no .bbl found
plain line four
";
        let out = classify(text, None, &table());
        assert_eq!(out.records.len(), 10);
        assert_eq!(out.count(Severity::Error), 3);
        assert_eq!(out.count(Severity::Warning), 2);
        assert_eq!(out.count(Severity::Info), 5);
    }

    #[test]
    fn test_unmatched_lines_are_info_without_origin() {
        let out = classify("hello\n", None, &table());
        assert_eq!(out.records[0].severity, Severity::Info);
        assert_eq!(out.records[0].origin, None);
        assert_eq!(out.records[0].display_text(), "hello");
    }

    #[test]
    fn test_latexmk_marker_enables_log_rules() {
        let text = "ERROR    Latexmk failed to compile main.tex\n! Missing $ inserted.\nl.33 x^2\n";
        let out = classify(text, None, &table());
        assert!(out.latex_failure);
        assert!(out.log_context);
        assert_eq!(out.records[0].origin, Some(Origin::Tool));
        assert_eq!(out.records[1].severity, Severity::Error);
        assert_eq!(out.records[1].origin, Some(Origin::LatexLog));
        assert_eq!(out.records[2].log_line, Some(33));
    }

    #[test]
    fn test_latexmk_in_progress_chatter_is_not_a_latex_failure() {
        let text = "INFO     Running latexmk on main.tex\nERROR    figure.png not found\n";
        let out = classify(text, None, &table());
        assert!(!out.latex_failure);
        assert!(!out.log_context);
        assert_eq!(out.count(Severity::Error), 1);
    }

    #[test]
    fn test_log_hint_enables_log_rules_without_marker() {
        let text = "! Emergency stop.\n";
        let without = classify(text, None, &table());
        assert_eq!(without.records[0].severity, Severity::Info);

        let hint = PathBuf::from("/tmp/main.log");
        let with = classify(text, Some(&hint), &table());
        assert!(!with.latex_failure);
        assert_eq!(with.records[0].severity, Severity::Error);
    }

    #[test]
    fn test_summary_line_prefers_labelled_line() {
        let t = table();
        let text = "INFO  working\nSummary: Saved main.tar.gz (3 files)\n\n";
        assert_eq!(summary_line(text, &t), Some("Summary: Saved main.tar.gz (3 files)"));
        assert_eq!(summary_line("a\nb\n\n", &t), Some("b"));
        assert_eq!(summary_line("", &t), None);
    }

    #[test]
    fn test_summary_message_strips_label() {
        let t = table();
        assert_eq!(summary_message("Summary: Saved x.tar.gz", &t), "Saved x.tar.gz");
        assert_eq!(summary_message("Saved x.tar.gz", &t), "Saved x.tar.gz");
    }
}
