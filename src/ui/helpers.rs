//! UI helper functions and utilities

use crate::ui::theme::Theme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Span;
use std::ops::Range;

/// Create a centered rect using up certain percentage of the available rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Split `text` into styled spans, highlighting the byte ranges in `matches`.
///
/// Ranges must be sorted, non-overlapping and on char boundaries, which is
/// what the search engine returns.
pub fn highlight_spans<'a>(text: &'a str, matches: &[Range<usize>], base: Style) -> Vec<Span<'a>> {
    let mut spans = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;
    for range in matches {
        let (start, end) = (range.start.min(text.len()), range.end.min(text.len()));
        if start < cursor {
            continue;
        }
        if start > cursor {
            spans.push(Span::styled(&text[cursor..start], base));
        }
        spans.push(Span::styled(&text[start..end], Theme::search_match()));
        cursor = end;
    }
    if cursor < text.len() {
        spans.push(Span::styled(&text[cursor..], base));
    }
    spans
}
