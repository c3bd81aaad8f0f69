use std::sync::Arc;

use sysmon::clients::status::StatusOptions;
use sysmon::clients::{procmon, scheddemo, status};
use sysmon::config::{KernelConfig, ProcmonConfig, SchedDemoConfig};
use sysmon::kernel::{Capture, Console, Kernel};

fn boot(ncpu: usize) -> (Arc<Kernel>, Capture) {
    let (console, capture) = Console::capture();
    let config = KernelConfig {
        tick_ms: 1,
        ncpu,
        quantum_ticks: 2,
        ..KernelConfig::default()
    };
    (Kernel::boot(&config, console).unwrap(), capture)
}

fn quick_procmon() -> ProcmonConfig {
    ProcmonConfig {
        startup_delay_ticks: 1,
        watch_iterations: 3,
        watch_interval_ticks: 2,
    }
}

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn status_all_sections() {
    let (kernel, capture) = boot(2);
    let task = kernel.attach("status").unwrap();
    status::run(&task, &StatusOptions::default().all()).unwrap();
    let out = capture.contents();
    assert!(out.contains("SYSMON KERNEL STATUS MONITOR"));
    assert!(out.contains("--- PROCESS QUEUES ---"));
    assert!(out.contains("--- PROCESS LIST ---"));
    assert!(out.contains("--- MEMORY DETAILS ---"));
    assert!(out.contains("--- SYSTEM CALL STATISTICS ---"));
    assert!(out.contains("getsysinfo"));
    assert!(out.contains("status"));
    kernel.halt();
}

#[test]
fn status_watch_stops_after_count() {
    let (kernel, capture) = boot(2);
    let task = kernel.attach("status").unwrap();
    let opts = StatusOptions {
        watch: true,
        count: Some(2),
        interval_ticks: 3,
        ..StatusOptions::default()
    };
    status::run(&task, &opts).unwrap();
    let out = capture.contents();
    assert_eq!(out.matches("SYSMON KERNEL STATUS MONITOR").count(), 2);
    assert_eq!(out.matches("Refreshing in 3 ticks").count(), 1);
    kernel.halt();
}

#[test]
fn procmon_without_command_lists_once() {
    let (kernel, capture) = boot(2);
    let task = kernel.attach("procmon").unwrap();
    procmon::run(&task, &[], &quick_procmon()).unwrap();
    let out = capture.contents();
    assert!(out.contains("Usage: sysmon procmon"));
    assert_eq!(out.matches("=== Processes [Mem:").count(), 1);
    assert!(!out.contains(">"));
    kernel.halt();
}

#[test]
fn procmon_supervises_a_spinning_target() {
    let (kernel, capture) = boot(2);
    let task = kernel.attach("procmon").unwrap();
    procmon::run(&task, &argv(&["spin", "10"]), &quick_procmon()).unwrap();
    let out = capture.contents();
    assert!(out.contains("=== PROCMON: spin ==="));
    assert!(out.contains("Target PID:"));
    assert!(out.contains("[spin finished]"));
    assert!(out.contains("=== Processes [Mem:"));
    kernel.halt();
}

#[test]
fn procmon_runs_builtin_calc_and_reports_bad_commands() {
    let (kernel, capture) = boot(2);
    let task = kernel.attach("procmon").unwrap();
    procmon::run(&task, &argv(&["calc", "6", "x", "7"]), &quick_procmon()).unwrap();
    procmon::run(&task, &argv(&["nosuch"]), &quick_procmon()).unwrap();
    let out = capture.contents();
    assert!(out.contains("6 x 7 = 42"));
    assert!(out.contains("[calc finished]"));
    assert!(out.contains("exec failed"));
    assert!(out.contains("[nosuch finished]"));
    kernel.halt();
}

#[test]
fn scheddemo_times_every_workload() {
    let (kernel, capture) = boot(1);
    let task = kernel.attach("scheddemo").unwrap();
    let config = SchedDemoConfig {
        default_procs: 3,
        min_procs: 2,
        max_procs: 3,
        bursts: vec![4, 2, 6],
    };
    let records = scheddemo::run(&task, None, &config, 2).unwrap();
    assert_eq!(records.len(), 3);
    for r in &records {
        assert!(r.completion >= r.arrival);
        assert!(r.turnaround >= r.burst, "{r:?}");
        assert_eq!(r.wait, r.turnaround - r.burst);
    }
    let out = capture.contents();
    assert!(out.contains("Processes: 3"));
    for i in 0..3 {
        assert!(out.contains(&format!("[P{i}] Start at")));
        assert!(out.contains(&format!("[P{i}] End at")));
    }
    assert!(out.contains("Avg TAT:"));
    kernel.halt();
}
