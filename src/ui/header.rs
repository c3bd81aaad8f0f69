use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Sparkline};

use crate::telemetry::{CpuInfo, SystemSnapshot};
use crate::ui::theme::Theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&SystemSnapshot>,
    cpus: &[CpuInfo],
    syscall_history: &VecDeque<u64>,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_branding(frame, chunks[0], snapshot, cpus, theme);
    render_mem_gauge(frame, chunks[1], snapshot, theme);
    render_syscall_sparkline(frame, chunks[2], syscall_history, theme);
}

fn bordered(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
}

fn render_branding(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&SystemSnapshot>,
    cpus: &[CpuInfo],
    theme: &Theme,
) {
    let block = bordered(theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dim = Style::default().fg(theme.text_secondary);
    let mut spans = vec![Span::styled(
        " sysmon ",
        Style::default()
            .fg(theme.header_accent_fg)
            .bg(theme.header_accent_bg)
            .add_modifier(Modifier::BOLD),
    )];
    match snapshot {
        Some(s) => {
            let q = &s.queue;
            spans.extend([
                Span::raw("  "),
                Span::styled(format!("up {}s", s.uptime_secs()), dim),
                Span::raw("  "),
                Span::styled(
                    format!(
                        "Procs: {} (R:{} S:{} Z:{})",
                        q.total, q.running, q.sleeping, q.zombie
                    ),
                    dim,
                ),
            ]);
        }
        None => spans.push(Span::styled(
            "  no data",
            Style::default().fg(theme.status_err),
        )),
    }

    let mut cpu_spans = vec![Span::styled(" CPUs:", dim)];
    for cpu in cpus {
        let text = if cpu.has_proc {
            format!(" {}:{}({})", cpu.cpu_id, cpu.proc_name, cpu.proc_pid)
        } else {
            format!(" {}:idle", cpu.cpu_id)
        };
        let color = if cpu.has_proc {
            theme.accent
        } else {
            theme.text_secondary
        };
        cpu_spans.push(Span::styled(text, Style::default().fg(color)));
    }

    let lines = vec![Line::from(spans), Line::from(cpu_spans)];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_mem_gauge(frame: &mut Frame, area: Rect, snapshot: Option<&SystemSnapshot>, theme: &Theme) {
    let block = bordered(theme).title(Span::styled(
        " MEM ",
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ));

    let (ratio, label) = match snapshot {
        Some(s) => {
            let mem = &s.mem;
            let ratio = if mem.total_pages > 0 {
                (f64::from(mem.used_pages) / f64::from(mem.total_pages)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let label = format!(
                "{}/{} KB ({}%)",
                mem.used_kb(),
                mem.total_kb(),
                mem.usage_percent()
            );
            (ratio, label)
        }
        None => (0.0, "-".to_string()),
    };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(
            Style::default()
                .fg(theme.gauge_filled)
                .bg(theme.gauge_unfilled),
        )
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_syscall_sparkline(
    frame: &mut Frame,
    area: Rect,
    syscall_history: &VecDeque<u64>,
    theme: &Theme,
) {
    let latest = syscall_history.back().copied().unwrap_or(0);
    let block = bordered(theme).title(Span::styled(
        format!(" SYSCALLS +{latest} "),
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ));

    // Only the newest samples that fit.
    let width = usize::from(area.width.saturating_sub(2));
    let skip = syscall_history.len().saturating_sub(width);
    let data: Vec<u64> = syscall_history.iter().skip(skip).copied().collect();
    let sparkline = Sparkline::default()
        .block(block)
        .data(&data)
        .style(Style::default().fg(theme.sparkline_color));
    frame.render_widget(sparkline, area);
}
