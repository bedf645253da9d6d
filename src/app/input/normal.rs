use crate::app::background;
use crate::app::RuntimeContext;
use crate::job::{DialogIntent, JobSnapshot};
use crate::search::SeverityFilter;
use crate::ui::App;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PAGE: usize = 10;

/// Handle key events in normal mode
pub(super) fn handle_normal_mode(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    let failed = matches!(app.snapshot(), JobSnapshot::Failed { .. });

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => quit(app),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => quit(app),
        KeyCode::Char('r') => background::start_job(app, ctx.tx.clone()),
        KeyCode::Char('c') => app.intent(DialogIntent::CopyOutput),
        KeyCode::Char('/') if failed => app.start_search(),
        KeyCode::Char('e') if failed => app.set_severity(SeverityFilter::ErrorsOnly),
        KeyCode::Char('w') if failed => app.set_severity(SeverityFilter::WarningsOnly),
        KeyCode::Char('a') if failed => app.set_severity(SeverityFilter::All),
        KeyCode::Char('l') if failed => app.intent(DialogIntent::OpenLog),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::PageUp => app.scroll_up(PAGE),
        KeyCode::Home => app.scroll = 0,
        KeyCode::End => app.scroll = app.row_count().saturating_sub(1),
        _ => {}
    }
    Ok(())
}

/// Dismiss a finished job and leave. A running job is left to the runtime
/// teardown, which kills the child.
fn quit(app: &mut App) {
    let finished = !matches!(
        app.snapshot(),
        JobSnapshot::Idle | JobSnapshot::Running { .. }
    );
    if finished {
        app.intent(DialogIntent::Dismiss);
    }
    app.should_quit = true;
}
