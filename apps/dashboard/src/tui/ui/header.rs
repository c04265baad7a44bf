use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::{COLOR_BRAND, COLOR_ERROR, COLOR_INFO, COLOR_LABEL, COLOR_MUTED, COLOR_SUCCESS};
use crate::tui::state::AppState;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    // Row 1: Brand + connection state
    let (dot, color) = if state.snapshot.is_connected() {
        ("● connected", COLOR_SUCCESS)
    } else {
        ("● disconnected", COLOR_ERROR)
    };

    let title = Line::from(vec![
        Span::styled("Fleet ", Style::default().fg(COLOR_BRAND).add_modifier(Modifier::BOLD)),
        Span::styled("dashboard  ", Style::default().fg(COLOR_LABEL)),
        Span::styled(dot, Style::default().fg(color)),
    ]);

    // Row 2: Probe target + status notification
    let mut status_spans =
        vec![Span::styled(format!("API {}", state.api_url), Style::default().fg(COLOR_MUTED))];

    if let Some((msg, _)) = &state.status_message {
        status_spans.push(Span::styled(format!(" -- {msg}"), Style::default().fg(COLOR_INFO)));
    }

    f.render_widget(Paragraph::new(vec![title, Line::from(status_spans)]), area);
}
