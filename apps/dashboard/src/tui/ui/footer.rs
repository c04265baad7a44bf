use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};

use super::{COLOR_BRAND, COLOR_LABEL};

pub fn render(f: &mut Frame, area: Rect, show_help: bool) {
    f.render_widget(Clear, area);

    let text = if show_help {
        "The indicator appears only while the network or the fleet API is unreachable. \
         R forces a check."
    } else {
        "R: Retry   H/?: Help   Q/Esc: Quit"
    };
    let style = if show_help {
        Style::default().fg(COLOR_LABEL)
    } else {
        Style::default().fg(COLOR_BRAND).add_modifier(Modifier::BOLD)
    };

    f.render_widget(Paragraph::new(Line::from(Span::styled(text, style))).alignment(Alignment::Center), area);
}
