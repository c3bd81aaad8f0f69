pub mod header;
pub mod help;
pub mod proc_table;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    header::render(
        frame,
        chunks[0],
        app.snapshot.as_ref(),
        &app.cpus,
        &app.syscall_history,
        &app.theme,
    );
    proc_table::render(
        frame,
        chunks[1],
        &app.procs,
        app.selected_index,
        app.sort_mode,
        &app.theme,
    );
    statusbar::render(frame, chunks[2], app, &app.theme);

    // Drawn last so it sits on top.
    if app.show_help() {
        help::render(frame, frame.area(), &app.help_entries(), &app.theme);
    }
}
