use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use serde::Deserialize;

use crate::kernel::MemoryLayout;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub kernel: KernelConfig,
    pub procmon: ProcmonConfig,
    pub scheddemo: SchedDemoConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub watch_interval_ticks: u64,
    pub top_interval_ticks: u64,
    pub theme: String,
    pub default_sort: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            watch_interval_ticks: 200,
            top_interval_ticks: 100,
            theme: "dark".to_string(),
            default_sort: "pid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub nproc: usize,
    pub ncpu: usize,
    pub page_size: u32,
    pub kernel_end: u32,
    pub phys_top: u32,
    pub tick_ms: u64,
    pub quantum_ticks: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            nproc: 64,
            ncpu: 2,
            page_size: 4096,
            kernel_end: 0x0011_54a8,
            phys_top: 0x0E00_0000,
            tick_ms: 10,
            quantum_ticks: 10,
        }
    }
}

impl KernelConfig {
    pub fn layout(&self) -> MemoryLayout {
        MemoryLayout {
            page_size: self.page_size,
            kernel_end: self.kernel_end,
            phys_top: self.phys_top,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcmonConfig {
    pub startup_delay_ticks: u64,
    pub watch_iterations: u32,
    pub watch_interval_ticks: u64,
}

impl Default for ProcmonConfig {
    fn default() -> Self {
        ProcmonConfig {
            startup_delay_ticks: 5,
            watch_iterations: 20,
            watch_interval_ticks: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedDemoConfig {
    pub default_procs: usize,
    pub min_procs: usize,
    pub max_procs: usize,
    /// Burst length of each workload in ticks; workload `i` uses entry `i`.
    pub bursts: Vec<u64>,
}

impl Default for SchedDemoConfig {
    fn default() -> Self {
        SchedDemoConfig {
            default_procs: 4,
            min_procs: 2,
            max_procs: 6,
            bursts: vec![15, 10, 20, 12, 18, 8],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
    pub help: String,
    pub cycle_sort: String,
    pub refresh: String,
    pub pause: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "q".to_string(),
            help: "?".to_string(),
            cycle_sort: "s".to_string(),
            refresh: "r".to_string(),
            pause: "p".to_string(),
        }
    }
}

/// Parses a keybind string: a single character or a named key.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match s.to_lowercase().as_str() {
        "enter" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "space" => Some(KeyCode::Char(' ')),
        "backspace" => Some(KeyCode::Backspace),
        "delete" | "del" => Some(KeyCode::Delete),
        _ => None,
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
