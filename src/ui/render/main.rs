use crate::classify::{self, Origin, Severity};
use crate::job::{FailureReport, JobSnapshot};
use crate::ui::helpers::{centered_rect, highlight_spans};
use crate::ui::theme::Theme;
use crate::ui::{App, InputMode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::path::Path;

pub(super) fn render_main(frame: &mut Frame, area: Rect, app: &App) {
    let inner = Rect {
        x: area.x + 2,
        y: area.y,
        width: area.width.saturating_sub(4),
        height: area.height,
    };

    match app.snapshot() {
        JobSnapshot::Idle => render_message(
            frame,
            inner,
            "No archive job",
            "Press r to package the selected file.",
            Theme::GREY_300,
        ),
        JobSnapshot::Running { elapsed, .. } => render_running(frame, inner, app, elapsed.as_secs()),
        JobSnapshot::Succeeded {
            summary, artifact, ..
        } => render_success(frame, inner, app, summary, artifact),
        JobSnapshot::Failed { target, report } => render_failure(frame, inner, app, target, report),
        JobSnapshot::LaunchFailure { message, .. } => {
            let title = format!("Could not run {}", app.board.context().tool_name);
            render_message(frame, inner, &title, message, Theme::RED)
        }
    }
}

fn render_running(frame: &mut Frame, area: Rect, app: &App, secs: u64) {
    let spinner = Theme::SPINNER_BRAILLE[app.spinner_frame % Theme::SPINNER_BRAILLE.len()];
    let command = app
        .target
        .as_deref()
        .and_then(|t| app.board.job(t))
        .map(|job| job.command.display())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} ", spinner), Theme::title()),
            Span::styled("Creating archive", Theme::title()),
            Span::styled(format!("  {}s", secs), Theme::text_dim()),
        ]),
        Line::from(""),
        Line::from(Span::styled(command, Theme::text_muted())),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_success(frame: &mut Frame, area: Rect, app: &App, summary: &str, artifact: &Path) {
    let ctx = app.board.context();
    let message = classify::summary_message(summary, app.board.rules());

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("{} ", Theme::CHECK_MARK),
                Style::default()
                    .fg(Theme::GREEN)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("Archive created", Theme::title()),
        ]),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Theme::text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  → ", Theme::text_dim()),
            Span::styled(ctx.display_path(artifact), Theme::text()),
        ]),
    ];
    if app.host.highlighted.as_deref() == Some(artifact) {
        lines.push(Line::from(Span::styled(
            "    selected in the current directory",
            Theme::text_dim(),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_failure(frame: &mut Frame, area: Rect, app: &App, target: &Path, report: &FailureReport) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    let filter = app.board.filter(target).cloned().unwrap_or_default();
    let errors = report.count(Severity::Error);
    let warnings = report.count(Severity::Warning);

    let mut status = vec![
        Span::styled(
            format!("{} error(s)", errors),
            Theme::severity(Severity::Error),
        ),
        Span::styled(format!(" {} ", Theme::DOT_SEPARATOR), Theme::text_dim()),
        Span::styled(
            format!("{} warning(s)", warnings),
            Theme::severity(Severity::Warning),
        ),
        Span::styled(
            format!("   showing {}", filter.severity.label()),
            Theme::text_muted(),
        ),
    ];
    if app.input_mode == InputMode::Search || !filter.term.is_empty() {
        let cursor = if app.input_mode == InputMode::Search { "▏" } else { "" };
        status.push(Span::styled("   / ", Theme::key()));
        status.push(Span::styled(
            format!("{}{}", filter.term, cursor),
            Theme::text(),
        ));
    }

    let header = vec![
        Line::from(Span::styled(
            report.headline(&app.board.context().tool_name),
            Style::default()
                .fg(Theme::RED)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(status),
    ];
    frame.render_widget(Paragraph::new(header), layout[0]);

    let view = app.board.view(target);
    let list_area = layout[1];
    if view.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("no results", Theme::text_dim()))),
            list_area,
        );
        return;
    }

    let rows = list_area.height as usize;
    let start = app.scroll.min(view.len().saturating_sub(1));
    let lines: Vec<Line> = view
        .visible
        .iter()
        .skip(start)
        .take(rows)
        .map(|visible| {
            let record = &report.records[visible.index];
            let base = Theme::severity(record.severity);
            let mut spans = vec![Span::styled(
                format!("{} ", Theme::severity_mark(record.severity)),
                base,
            )];
            spans.extend(highlight_spans(record.display_text(), &visible.spans, base));
            if let (Some(line), Some(Origin::LatexLog)) = (record.log_line, record.origin) {
                spans.push(Span::styled(format!("   log:{}", line), Theme::text_dim()));
            }
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), list_area);
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, body: &str, accent: ratatui::style::Color) {
    let popup = centered_rect(70, 40, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ));
    let paragraph = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(body, Theme::text()))])
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup);
}
