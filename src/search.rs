//! Search and severity filtering over classified records
//!
//! A pure derivation: the same records and [`FilterState`] always give the
//! same [`SearchView`]. Records are never touched.

use crate::classify::{DiagnosticRecord, Severity};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    #[default]
    All,
    ErrorsOnly,
    WarningsOnly,
}

impl SeverityFilter {
    pub fn admits(&self, severity: Severity) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::ErrorsOnly => severity == Severity::Error,
            SeverityFilter::WarningsOnly => severity == Severity::Warning,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityFilter::All => "all",
            SeverityFilter::ErrorsOnly => "errors",
            SeverityFilter::WarningsOnly => "warnings",
        }
    }
}

/// Per-view filter state owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub severity: SeverityFilter,
    pub term: String,
}

impl FilterState {
    pub fn new(severity: SeverityFilter, term: &str) -> Self {
        Self {
            severity,
            term: term.to_string(),
        }
    }
}

/// One visible record and where the search term matched in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRecord {
    /// Index into the full record list.
    pub index: usize,
    /// Byte ranges into the record's `text`, left to right, non-overlapping.
    pub spans: Vec<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchView {
    pub visible: Vec<VisibleRecord>,
    pub total: usize,
}

impl SearchView {
    /// No record survived the filter. A valid outcome, shown as "no results".
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn match_count(&self) -> usize {
        self.visible.iter().map(|v| v.spans.len()).sum()
    }
}

/// Compute the visible subset of `records` under `state`.
pub fn search_filter(records: &[DiagnosticRecord], state: &FilterState) -> SearchView {
    let needle: String = state.term.chars().flat_map(fold_case).collect();
    let visible = records
        .iter()
        .enumerate()
        .filter(|(_, record)| state.severity.admits(record.severity))
        .filter_map(|(index, record)| {
            if needle.is_empty() {
                return Some(VisibleRecord {
                    index,
                    spans: Vec::new(),
                });
            }
            let spans = find_case_insensitive(record.display_text(), &needle);
            (!spans.is_empty()).then_some(VisibleRecord { index, spans })
        })
        .collect();

    SearchView {
        visible,
        total: records.len(),
    }
}

/// Per-char case fold shared by needle and haystack. `str::to_lowercase`
/// is context-sensitive (word-final `Σ` becomes `ς`), so both sides are folded
/// one char at a time, with final sigma mapped to `σ`.
fn fold_case(ch: char) -> impl Iterator<Item = char> {
    ch.to_lowercase().map(|c| if c == 'ς' { 'σ' } else { c })
}

/// Case-insensitive substring search returning byte ranges into `haystack`.
///
/// `needle` must already be folded with [`fold_case`]. Folding can change
/// byte lengths (e.g. `İ`), so matches are found in a folded copy and mapped
/// back through a per-byte offset table.
fn find_case_insensitive(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    let mut lowered = String::with_capacity(haystack.len());
    // For each byte of `lowered`: (start, end) of the source char in `haystack`.
    let mut origin: Vec<(usize, usize)> = Vec::with_capacity(haystack.len());
    for (start, ch) in haystack.char_indices() {
        let end = start + ch.len_utf8();
        for lower in fold_case(ch) {
            let before = lowered.len();
            lowered.push(lower);
            origin.extend(std::iter::repeat((start, end)).take(lowered.len() - before));
        }
    }

    let mut spans: Vec<Range<usize>> = Vec::new();
    let mut from = 0;
    while let Some(pos) = lowered[from..].find(needle) {
        let lo = from + pos;
        let hi = lo + needle.len();
        let start = origin[lo].0;
        let end = origin[hi - 1].1;
        // A match starting inside the char that ended the previous match
        // would overlap in source bytes.
        if spans.last().map_or(true, |prev| start >= prev.end) {
            spans.push(start..end);
        }
        from = hi;
    }
    spans
}
