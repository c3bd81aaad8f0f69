//! Workload cohort timing: start N CPU-bound children together and measure
//! how the scheduler shares the machine between them.

use std::fmt;

use super::programs::spin;
use crate::config::SchedDemoConfig;
use crate::kernel::{KernelError, Task};

const RULE: &str = "================================================";
const FALLBACK_BURST: u64 = 10;

/// Timing of one workload, in ticks since the cohort started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadRecord {
    pub pid: u32,
    pub arrival: u64,
    pub burst: u64,
    pub completion: u64,
    pub turnaround: u64,
    pub wait: u64,
}

impl WorkloadRecord {
    /// Turnaround is completion minus arrival, wait is turnaround minus
    /// burst. Neither goes below zero.
    pub fn complete(&mut self, completion: u64) {
        self.completion = completion;
        self.turnaround = completion.saturating_sub(self.arrival);
        self.wait = self.turnaround.saturating_sub(self.burst);
    }
}

/// Requested cohort size pulled into the configured bounds.
pub fn cohort_size(requested: Option<usize>, config: &SchedDemoConfig) -> usize {
    let max = config.max_procs.max(config.min_procs);
    requested
        .unwrap_or(config.default_procs)
        .clamp(config.min_procs, max)
}

fn burst_for(config: &SchedDemoConfig, i: usize) -> u64 {
    if config.bursts.is_empty() {
        return FALLBACK_BURST;
    }
    config.bursts[i % config.bursts.len()]
}

/// Mean turnaround and wait, rounded down.
pub fn averages(records: &[WorkloadRecord]) -> (u64, u64) {
    if records.is_empty() {
        return (0, 0);
    }
    let n = records.len() as u64;
    let tat: u64 = records.iter().map(|r| r.turnaround).sum();
    let wt: u64 = records.iter().map(|r| r.wait).sum();
    (tat / n, wt / n)
}

pub fn run(
    task: &Task,
    requested: Option<usize>,
    config: &SchedDemoConfig,
    quantum_ticks: u64,
) -> Result<Vec<WorkloadRecord>, KernelError> {
    let n = cohort_size(requested, config);

    let mut plan = format!(
        "\n{RULE}\n      SYSMON Round Robin Scheduling Demo\n{RULE}\n\n\
         Time Quantum: ~{quantum_ticks} ticks\nProcesses: {n}\n\nPlanned Burst Times:\n"
    );
    for i in 0..n {
        plan.push_str(&format!("  P{i}: {} ticks\n", burst_for(config, i)));
    }
    task.print(&plan);

    let start = task.uptime()?;
    task.print("\n--- Execution ---\n\n");

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let burst = burst_for(config, i);
        let arrival = task.uptime()?.saturating_sub(start);
        let pid = task.fork(Box::new(move |child: &Task| {
            let began = child.uptime()?;
            child.print(&format!("[P{i}] Start at {}\n", began.saturating_sub(start)));
            spin(child, burst)?;
            let ended = child.uptime()?;
            child.print(&format!("[P{i}] End at {}\n", ended.saturating_sub(start)));
            Ok(())
        }))?;
        records.push(WorkloadRecord {
            pid,
            arrival,
            burst,
            ..WorkloadRecord::default()
        });
    }

    for _ in 0..n {
        let pid = match task.wait() {
            Ok(pid) => pid,
            Err(KernelError::NoChildren) => break,
            Err(err) => return Err(err),
        };
        let completion = task.uptime()?.saturating_sub(start);
        if let Some(record) = records.iter_mut().find(|r| r.pid == pid) {
            record.complete(completion);
        }
    }

    task.print(&StatsTable(&records).to_string());
    Ok(records)
}

/// Per-workload metrics, averages and legend.
pub struct StatsTable<'a>(pub &'a [WorkloadRecord]);

impl fmt::Display for StatsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "--- Statistics ---")?;
        writeln!(f)?;
        writeln!(f, "Proc  AT   BT   CT   TAT  WT")?;
        writeln!(f, "----  ---  ---  ---  ---  ---")?;
        for (i, r) in self.0.iter().enumerate() {
            writeln!(
                f,
                "{:<6}{:<5}{:<5}{:<5}{:<5}{}",
                format!("P{i}"),
                r.arrival,
                r.burst,
                r.completion,
                r.turnaround,
                r.wait
            )?;
        }
        let (tat, wt) = averages(self.0);
        writeln!(f)?;
        writeln!(f, "Avg TAT: {tat}  Avg WT: {wt}")?;
        writeln!(f)?;
        writeln!(f, "Legend:")?;
        writeln!(f, "  AT=Arrival  BT=Burst  CT=Completion")?;
        writeln!(f, "  TAT=Turnaround(CT-AT)  WT=Wait(TAT-BT)")?;
        writeln!(f, "{RULE}")?;
        writeln!(f)
    }
}
