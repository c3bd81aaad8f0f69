use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, key_label};
use crate::ui::theme::Theme;

pub fn render(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let bg_style = Style::default().bg(theme.statusbar_bg);

    // Status message takes priority
    if let Some((msg, _)) = &app.status_message {
        let line = Line::from(Span::styled(
            format!(" {msg}"),
            Style::default()
                .fg(theme.status_err)
                .add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line).style(bg_style), area);
        return;
    }

    let kb = &app.keybinds;
    let quit = key_label(kb.quit);
    let sort = key_label(kb.cycle_sort);
    let pause = key_label(kb.pause);
    let refresh = key_label(kb.refresh);
    let help = key_label(kb.help);

    let mut spans = Vec::new();
    if app.paused {
        spans.push(Span::styled(
            " PAUSED ",
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.status_err)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.extend(pill_spans(&quit, "Quit", theme));
    spans.extend(pill_spans(&sort, app.sort_mode.label(), theme));
    spans.extend(pill_spans(&pause, if app.paused { "Resume" } else { "Pause" }, theme));
    spans.extend(pill_spans(&refresh, "Refresh", theme));
    spans.extend(pill_spans(&help, "Help", theme));
    if let Some(stats) = &app.syscalls {
        spans.push(Span::styled(
            format!("  syscalls: {}", stats.total_calls),
            Style::default().fg(theme.status_ok),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(bg_style), area);
}

fn pill_spans<'a>(key: &str, desc: &str, theme: &Theme) -> Vec<Span<'a>> {
    vec![
        Span::raw(" "),
        Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {desc}"),
            Style::default().fg(theme.pill_desc_fg).bg(theme.surface_bg),
        ),
    ]
}
