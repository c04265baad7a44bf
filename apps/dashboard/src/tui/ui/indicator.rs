use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::{COLOR_BRAND, COLOR_ERROR, COLOR_LABEL, COLOR_MUTED};
use crate::tui::state::AppState;

/// ConnectionStatus panel. Draws nothing while connected.
pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(view) = state.indicator() else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let lines = vec![
        Line::from(Span::styled(view.message, Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(view.detail, Style::default().fg(COLOR_LABEL))),
        Line::from(Span::styled(view.last_checked_label(), Style::default().fg(COLOR_MUTED))),
        Line::from(""),
        Line::from(Span::styled(
            format!("[R] {}", view.retry.label),
            Style::default().fg(COLOR_BRAND).add_modifier(Modifier::BOLD),
        )),
    ];

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_ERROR))
                .title(" Connection Status "),
        );

    f.render_widget(panel, rows[0]);
}
