use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table, TableState};

use crate::app::SortMode;
use crate::format::{format_bytes, truncate_unicode};
use crate::telemetry::ProcessRecord;
use crate::ui::theme::Theme;

const NAME_WIDTH: usize = 15;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    procs: &[ProcessRecord],
    selected: usize,
    sort_mode: SortMode,
    theme: &Theme,
) {
    let header_style = Style::default()
        .fg(theme.text_secondary)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(["PID", "PPID", "STATE", "SIZE", "NAME"]).style(header_style);

    let rows = procs.iter().map(|p| {
        let mut name = truncate_unicode(p.name.as_str(), NAME_WIDTH);
        if p.killed {
            name.push_str(" [killed]");
        }
        let ppid = if p.ppid == 0 {
            "-".to_string()
        } else {
            p.ppid.to_string()
        };
        Row::new([
            Cell::from(p.pid.to_string()),
            Cell::from(ppid),
            Cell::from(Span::styled(
                p.state.queue_label(),
                Style::default().fg(theme.state_color(p.state)),
            )),
            Cell::from(format_bytes(u64::from(p.size_bytes))),
            Cell::from(name),
        ])
        .style(Style::default().fg(theme.text_primary))
    });

    let title = Span::styled(
        format!(" Processes ({}) sorted by {} ", procs.len(), sort_mode.label()),
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.overlay_border))
            .title(title),
    )
    .row_highlight_style(
        Style::default()
            .bg(theme.selection_bg)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    let mut state = TableState::default();
    if !procs.is_empty() {
        state.select(Some(selected.min(procs.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
