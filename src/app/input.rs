//! Input handling for the TUI

use crate::app::RuntimeContext;
use crate::ui::{App, InputMode};
use anyhow::Result;
use crossterm::event::KeyEvent;

mod normal;
mod search;

use normal::handle_normal_mode;
use search::handle_search_input;

/// Main key event handler - dispatches to mode-specific handlers
pub fn handle_key_event(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    match app.input_mode {
        InputMode::Search => handle_search_input(app, key),
        InputMode::Normal => handle_normal_mode(app, key, ctx),
    }
}
