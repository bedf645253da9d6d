use crate::job::JobSnapshot;
use crate::ui::theme::Theme;
use crate::ui::{App, InputMode};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub(super) fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled("  ", Style::default())];

    let ctx = app.board.context();
    spans.push(Span::styled(
        ctx.display_path(&app.host.browse_dir),
        Style::default().fg(Theme::GREY_400),
    ));
    if ctx.tool_path.is_none() {
        spans.push(Span::styled(
            format!("  {} not on PATH", ctx.tool_name),
            Style::default().fg(Theme::YELLOW),
        ));
    }

    let hints = hints_for(app);
    let hints_len: usize = hints.iter().map(|(k, l)| k.chars().count() + l.chars().count() + 4).sum();
    let status_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let spacer_len = (area.width as usize).saturating_sub(status_len + hints_len + 2);
    if spacer_len > 0 {
        spans.push(Span::styled(" ".repeat(spacer_len), Style::default()));
    }

    for (key, label) in hints {
        spans.push(Span::styled(
            format!(" {} ", key),
            Style::default().fg(Theme::GREY_900).bg(Theme::GREY_500),
        ));
        spans.push(Span::styled(
            format!(" {} ", label),
            Style::default().fg(Theme::GREY_500),
        ));
    }

    let footer = Paragraph::new(vec![Line::from(""), Line::from(spans)])
        .style(Style::default().bg(Theme::BG));
    frame.render_widget(footer, area);
}

fn hints_for(app: &App) -> Vec<(&'static str, &'static str)> {
    if app.input_mode == InputMode::Search {
        return vec![("↵", "keep"), ("Esc", "clear")];
    }
    match app.snapshot() {
        JobSnapshot::Idle => vec![("r", "run"), ("q", "quit")],
        JobSnapshot::Running { .. } => vec![("q", "quit")],
        JobSnapshot::Succeeded { .. } => vec![("c", "copy"), ("r", "re-run"), ("q", "quit")],
        JobSnapshot::Failed { report, .. } => {
            let mut hints = vec![("/", "search"), ("e", "errors"), ("w", "warnings"), ("a", "all")];
            if report.offers_open_log() {
                hints.push(("l", "log"));
            }
            hints.extend([("c", "copy"), ("r", "re-run"), ("q", "quit")]);
            hints
        }
        JobSnapshot::LaunchFailure { .. } => vec![("r", "retry"), ("q", "quit")],
    }
}
