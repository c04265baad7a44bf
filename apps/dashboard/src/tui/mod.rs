mod events;
mod state;
mod ui;

use anyhow::Result;
use connectivity::MonitorHandle;
use crossterm::cursor::{Hide, Show};
use crossterm::event;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;

use state::AppState;

/// Run the connection status TUI until the user quits
pub async fn run_tui(monitor: MonitorHandle, api_url: String) -> Result<()> {
    // Attaching starts the monitor; detaching on exit stops it
    let mut sub = monitor.subscribe()?;
    let mut state = AppState::new(api_url, sub.snapshot());

    // Init terminal in alternate screen
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let backend = CrosstermBackend::new(&mut stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = loop {
        if let Some(snapshot) = sub.poll_changed() {
            tracing::debug!(connected = snapshot.is_connected(), "TUI: received connectivity update");
            state.update_snapshot(snapshot);
        }
        state.clear_expired_status();

        // Only redraw when something visible changed
        if state.dirty {
            if let Err(e) = terminal.draw(|f| ui::render(f, &state)) {
                break Err(e.into());
            }
            state.dirty = false;
        }

        match event::poll(Duration::from_millis(250)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if events::handle_event(&mut state, ev, &sub) {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }
    };

    // Cleanup terminal
    drop(terminal);
    let exec_result = execute!(stdout, Show, LeaveAlternateScreen);
    let raw_mode_result = disable_raw_mode();
    exec_result.and(raw_mode_result)?;
    result
}
