use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::kernel::ProcState;
use crate::ui::theme::Theme;

const LEGEND: [ProcState; 5] = [
    ProcState::Running,
    ProcState::Runnable,
    ProcState::Sleeping,
    ProcState::Zombie,
    ProcState::Embryo,
];

/// Keybinds followed by the state color legend, centered over `area`.
pub fn render(frame: &mut Frame, area: Rect, entries: &[(String, &str)], theme: &Theme) {
    let key_style = Style::default()
        .fg(theme.pill_key_fg)
        .bg(theme.pill_key_bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(theme.pill_desc_fg);

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!(" {key:>8} "), key_style),
                Span::styled(format!("  {desc}"), desc_style),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    let mut legend = vec![Span::styled(" States:", desc_style)];
    for state in LEGEND {
        legend.push(Span::styled(
            format!(" {}", state.queue_label()),
            Style::default().fg(theme.state_color(state)),
        ));
    }
    lines.push(Line::from(legend));

    let width = 48u16.min(area.width.saturating_sub(4));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let overlay = centered_rect(width, height, area);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            " sysmon top ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.surface_bg)),
        inner,
    );
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [vert] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [horiz] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(vert);
    horiz
}
