pub mod footer;
pub mod header;
pub mod indicator;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Color;

use crate::tui::state::AppState;

pub const COLOR_BRAND: Color = Color::Cyan;
pub const COLOR_LABEL: Color = Color::Gray;
pub const COLOR_MUTED: Color = Color::DarkGray;
pub const COLOR_SUCCESS: Color = Color::Green;
pub const COLOR_ERROR: Color = Color::Red;
pub const COLOR_INFO: Color = Color::Yellow;

/// Render the entire UI
pub fn render(f: &mut Frame, state: &AppState) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(2), Constraint::Min(1), Constraint::Length(1)])
        .split(size);

    header::render(f, chunks[0], state);
    indicator::render(f, chunks[1], state);
    footer::render(f, chunks[2], state.show_help);
}
