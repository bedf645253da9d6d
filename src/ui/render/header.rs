use crate::job::JobSnapshot;
use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub(super) fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let ctx = app.board.context();
    let (target, state, color) = match app.snapshot() {
        JobSnapshot::Idle => (None, "idle", Theme::GREY_400),
        JobSnapshot::Running { target, .. } => (Some(target), "running", Theme::GREY_100),
        JobSnapshot::Succeeded { target, .. } => (Some(target), "done", Theme::GREEN),
        JobSnapshot::Failed { target, .. } => (Some(target), "failed", Theme::RED),
        JobSnapshot::LaunchFailure { target, .. } => (Some(target), "could not start", Theme::RED),
    };

    let mut spans = vec![Span::styled(
        format!("   {}   ", Theme::TITLE),
        Style::default()
            .fg(Theme::WHITE)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(target) = target {
        spans.push(Span::styled(ctx.display_path(target), Theme::text()));
        spans.push(Span::styled(
            format!(" {} ", Theme::DOT_SEPARATOR),
            Theme::text_dim(),
        ));
    }
    spans.push(Span::styled(state, Style::default().fg(color)));

    let lines = vec![Line::from(""), Line::from(spans)];
    let header = Paragraph::new(lines).style(Style::default().bg(Theme::BG));
    frame.render_widget(header, area);
}
