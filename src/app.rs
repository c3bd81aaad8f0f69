use std::collections::VecDeque;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug_span, warn};

use crate::action::{Action, Direction};
use crate::config::{Config, parse_key};
use crate::kernel::ProcState;
use crate::telemetry::{
    CpuInfo, ProcessRecord, QueryInterface, SyscallStats, SystemSnapshot, TelemetryError,
};
use crate::ui::theme::Theme;

/// Buffer sizes handed to the queries on every refresh.
pub const MAX_PROCS: usize = 64;
pub const MAX_CPUS: usize = crate::kernel::NCPU;
/// Refreshes kept for the syscall-rate sparkline.
const HISTORY_LEN: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
}

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub help: KeyCode,
    pub cycle_sort: KeyCode,
    pub refresh: KeyCode,
    pub pause: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &crate::config::KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            help: parse_key(&kb.help).unwrap_or(KeyCode::Char('?')),
            cycle_sort: parse_key(&kb.cycle_sort).unwrap_or(KeyCode::Char('s')),
            refresh: parse_key(&kb.refresh).unwrap_or(KeyCode::Char('r')),
            pause: parse_key(&kb.pause).unwrap_or(KeyCode::Char('p')),
        }
    }

    /// Returns (key_label, description) pairs for all configurable keybinds.
    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        let mut entries = vec![
            (key_label(self.quit), "Quit"),
            (key_label(self.help), "Toggle help"),
            (key_label(self.cycle_sort), "Cycle sort mode"),
            (key_label(self.refresh), "Refresh now"),
            (key_label(self.pause), "Pause updates"),
        ];
        entries.push(("↑↓".to_string(), "Select process"));
        entries.push(("Ctrl+C".to_string(), "Quit (always)"));
        entries
    }
}

pub fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        KeyCode::Delete => "Del".to_string(),
        _ => "?".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Pid,
    State,
    Memory,
    Name,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Pid => SortMode::State,
            SortMode::State => SortMode::Memory,
            SortMode::Memory => SortMode::Name,
            SortMode::Name => SortMode::Pid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Pid => "PID",
            SortMode::State => "State",
            SortMode::Memory => "Memory",
            SortMode::Name => "Name",
        }
    }

    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "state" => SortMode::State,
            "memory" | "mem" | "size" => SortMode::Memory,
            "name" => SortMode::Name,
            _ => SortMode::Pid,
        }
    }

    fn sort(self, procs: &mut [ProcessRecord]) {
        match self {
            SortMode::Pid => procs.sort_by_key(|p| p.pid),
            SortMode::State => procs.sort_by_key(|p| (state_rank(p.state), p.pid)),
            SortMode::Memory => {
                procs.sort_by_key(|p| (std::cmp::Reverse(p.size_bytes), p.pid));
            }
            SortMode::Name => procs.sort_by(|a, b| {
                a.name
                    .as_str()
                    .to_lowercase()
                    .cmp(&b.name.as_str().to_lowercase())
                    .then(a.pid.cmp(&b.pid))
            }),
        }
    }
}

/// Running first, then ready, sleeping, the rest.
fn state_rank(state: ProcState) -> u8 {
    match state {
        ProcState::Running => 0,
        ProcState::Runnable => 1,
        ProcState::Sleeping => 2,
        ProcState::Embryo => 3,
        ProcState::Zombie => 4,
        ProcState::Unused => 5,
    }
}

/// State of the interactive top view. Every refresh goes through `source`,
/// the same query boundary the command-line clients use.
pub struct App<'q> {
    pub running: bool,
    pub paused: bool,
    pub input_mode: InputMode,
    pub snapshot: Option<SystemSnapshot>,
    pub procs: Vec<ProcessRecord>,
    pub cpus: Vec<CpuInfo>,
    pub syscalls: Option<SyscallStats>,
    /// Syscalls made between consecutive refreshes, oldest first.
    pub syscall_history: VecDeque<u64>,
    pub selected_index: usize,
    pub sort_mode: SortMode,
    pub theme: Theme,
    pub keybinds: ResolvedKeybinds,
    pub status_message: Option<(String, Instant)>,
    source: &'q dyn QueryInterface,
}

impl<'q> App<'q> {
    pub fn new(config: &Config, source: &'q dyn QueryInterface) -> Self {
        let mut app = App {
            running: true,
            paused: false,
            input_mode: InputMode::Normal,
            snapshot: None,
            procs: Vec::new(),
            cpus: Vec::new(),
            syscalls: None,
            syscall_history: VecDeque::with_capacity(HISTORY_LEN),
            selected_index: 0,
            sort_mode: SortMode::from_str_config(&config.general.default_sort),
            theme: Theme::from_config(&config.general.theme),
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
            status_message: None,
            source,
        };
        app.refresh_data();
        app
    }

    /// Polls every query once. A failed system snapshot clears the view
    /// rather than showing stale numbers.
    pub fn refresh_data(&mut self) {
        let _span = debug_span!("app.refresh_data").entered();
        match self.poll() {
            Ok(()) => {
                let expired = self
                    .status_message
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed().as_secs() >= 3);
                if expired {
                    self.status_message = None;
                }
            }
            Err(err) => {
                warn!(%err, "top: no data");
                self.snapshot = None;
                self.procs.clear();
                self.cpus.clear();
                self.status_message = Some((format!("No data: {err}"), Instant::now()));
            }
        }
        if self.selected_index >= self.procs.len() {
            self.selected_index = self.procs.len().saturating_sub(1);
        }
    }

    fn poll(&mut self) -> Result<(), TelemetryError> {
        let q = self.source;
        let mut snapshot = SystemSnapshot::default();
        q.getsysinfo(&mut snapshot)?;

        let mut buf = [ProcessRecord::default(); MAX_PROCS];
        let n = q.getprocinfo(&mut buf, MAX_PROCS)?;
        let mut procs = buf[..n].to_vec();
        self.sort_mode.sort(&mut procs);

        let mut cpu_buf = [CpuInfo::default(); MAX_CPUS];
        let ncpu = q.getcpuinfo(&mut cpu_buf, MAX_CPUS)?;

        let mut stats = SyscallStats::default();
        let stats = q.getsyscallstats(&mut stats).ok().map(|()| stats);
        if let (Some(prev), Some(now)) = (self.syscalls, stats) {
            if self.syscall_history.len() == HISTORY_LEN {
                self.syscall_history.pop_front();
            }
            self.syscall_history
                .push_back(now.total_calls.saturating_sub(prev.total_calls));
        }
        self.syscalls = stats;

        self.snapshot = Some(snapshot);
        self.procs = procs;
        self.cpus = cpu_buf[..ncpu].to_vec();
        Ok(())
    }

    /// Periodic refresh; skipped while paused.
    pub fn on_tick(&mut self) {
        if !self.paused {
            self.refresh_data();
        }
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits (hardwired safety)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Normal => self.map_key_normal(key),
            InputMode::Help => self.map_key_help(key),
        }
    }

    fn map_key_normal(&self, key: KeyEvent) -> Action {
        let code = key.code;
        let kb = &self.keybinds;

        match code {
            KeyCode::Up => return Action::Navigate(Direction::Up),
            KeyCode::Down => return Action::Navigate(Direction::Down),
            _ => {}
        }

        if code == kb.quit {
            return Action::Quit;
        }
        if code == kb.help {
            return Action::ToggleHelp;
        }
        if code == kb.cycle_sort {
            return Action::CycleSortMode;
        }
        if code == kb.refresh {
            return Action::Refresh;
        }
        if code == kb.pause {
            return Action::TogglePause;
        }

        Action::None
    }

    fn map_key_help(&self, key: KeyEvent) -> Action {
        let code = key.code;
        // In help mode, only the help key and Esc dismiss, everything else is ignored
        if code == self.keybinds.help || code == KeyCode::Esc {
            return Action::ToggleHelp;
        }
        Action::None
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Navigate(dir) => self.navigate(dir),
            Action::ToggleHelp => {
                self.input_mode = if self.input_mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
            }
            Action::CycleSortMode => {
                let selected = self.selected_pid();
                self.sort_mode = self.sort_mode.next();
                self.sort_mode.sort(&mut self.procs);
                if let Some(pid) = selected {
                    self.selected_index = self
                        .procs
                        .iter()
                        .position(|p| p.pid == pid)
                        .unwrap_or(0);
                }
            }
            Action::TogglePause => {
                self.paused = !self.paused;
            }
            Action::Refresh => self.refresh_data(),
            Action::None => {}
        }
    }

    fn navigate(&mut self, direction: Direction) {
        if self.procs.is_empty() {
            return;
        }
        self.selected_index = match direction {
            Direction::Up => self.selected_index.saturating_sub(1),
            Direction::Down => (self.selected_index + 1).min(self.procs.len() - 1),
        };
    }

    pub fn selected_pid(&self) -> Option<u32> {
        self.procs.get(self.selected_index).map(|p| p.pid)
    }

    pub fn show_help(&self) -> bool {
        self.input_mode == InputMode::Help
    }

    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        self.keybinds.help_entries()
    }
}
