use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};

use connectivity::ForceCheck;

use crate::tui::state::AppState;

/// Handle a terminal event. Returns `true` when the user asked to quit.
pub fn handle_event(state: &mut AppState, ev: Event, monitor: &impl ForceCheck) -> bool {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(state, key, monitor),
        Event::Resize(_, _) => {
            state.dirty = true;
            false
        }
        _ => false,
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent, monitor: &impl ForceCheck) -> bool {
    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc if key.modifiers.is_empty() => {
            return true;
        }

        // Help toggle
        KeyCode::Char('h') | KeyCode::Char('?') if key.modifiers.is_empty() => {
            state.show_help = !state.show_help;
            state.dirty = true;
        }

        // Retry, only offered while the indicator is visible
        KeyCode::Char('r') | KeyCode::Char('R') => match state.indicator() {
            Some(view) => {
                view.retry.activate(monitor);
                state.set_status("Checking connection...");
            }
            None => state.set_status("Already connected"),
        },

        _ => {}
    }

    false
}
