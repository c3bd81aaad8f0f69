use tracing::debug_span;

use super::error::Result;
use super::types::{CpuInfo, ProcessQueueSummary, ProcessRecord};
use crate::kernel::{Cpus, ProcName, ProcessTable};

/// Copies live processes into `out`, stopping at `max_entries` or the end of
/// `out`, whichever comes first. The table lock is held across the whole scan
/// so every record reflects the same instant. Processes past the limit are
/// left out without an error.
pub fn get_process_info(
    table: &ProcessTable,
    out: &mut [ProcessRecord],
    max_entries: usize,
) -> Result<usize> {
    let _span = debug_span!("get_process_info", max_entries).entered();
    let limit = max_entries.min(out.len());
    let table = table.lock()?;
    let mut count = 0;
    for proc in table.slots().iter().filter(|p| p.state.is_live()) {
        if count == limit {
            break;
        }
        out[count] = ProcessRecord::from(proc);
        count += 1;
    }
    Ok(count)
}

/// One locked pass over the table, tallying each slot once.
pub fn process_queue_summary(table: &ProcessTable) -> Result<ProcessQueueSummary> {
    let table = table.lock()?;
    let mut summary = ProcessQueueSummary::default();
    for proc in table.slots() {
        summary.tally(proc.state);
    }
    Ok(summary)
}

/// Which process sits on each CPU. The CPU slots are read and released
/// before the table is locked to resolve names, so a process can leave its
/// CPU in between; its row then still shows the pid it had.
pub fn get_cpu_info(
    cpus: &Cpus,
    table: &ProcessTable,
    out: &mut [CpuInfo],
    max_entries: usize,
) -> Result<usize> {
    let _span = debug_span!("get_cpu_info", max_entries).entered();
    let occupants = cpus.occupants()?;
    let limit = max_entries.min(out.len()).min(cpus.count());
    let table = table.lock()?;
    for (id, (slot, occupant)) in out.iter_mut().zip(&occupants).take(limit).enumerate() {
        *slot = match *occupant {
            Some(pid) => CpuInfo {
                cpu_id: id as u32,
                has_proc: true,
                proc_pid: pid,
                proc_name: table.get(pid).map(|p| p.name).unwrap_or_default(),
            },
            None => CpuInfo {
                cpu_id: id as u32,
                has_proc: false,
                proc_pid: 0,
                proc_name: ProcName::default(),
            },
        };
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Channel, ProcState};
    use crate::telemetry::TelemetryError;
    use std::thread;

    fn table_with(states: &[ProcState]) -> ProcessTable {
        let table = ProcessTable::new(8);
        {
            let mut t = table.lock().unwrap();
            for (i, &state) in states.iter().enumerate() {
                let pid = t.alloc(&format!("p{i}"), 0, 4096).unwrap();
                t.set_state(pid, state, Channel::NONE).unwrap();
            }
        }
        table
    }

    fn poison(table: &ProcessTable) {
        thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = table.lock().unwrap();
                    panic!("poisoning the process table");
                })
                .join();
        });
    }

    #[test]
    fn queue_summary_counts_each_live_process_once() {
        let table = table_with(&[ProcState::Running, ProcState::Sleeping, ProcState::Zombie]);
        let summary = process_queue_summary(&table).unwrap();
        assert_eq!(
            summary,
            ProcessQueueSummary {
                unused: 5,
                embryo: 0,
                sleeping: 1,
                runnable: 0,
                running: 1,
                zombie: 1,
                total: 3,
            }
        );
    }

    #[test]
    fn process_info_truncates_at_max_entries() {
        let table = table_with(&[ProcState::Running; 5]);
        let mut out = [ProcessRecord::default(); 8];
        assert_eq!(get_process_info(&table, &mut out, 3).unwrap(), 3);
        assert_eq!(out[3], ProcessRecord::default());
    }

    #[test]
    fn process_info_never_overruns_the_buffer() {
        let table = table_with(&[ProcState::Running; 5]);
        let mut out = [ProcessRecord::default(); 2];
        assert_eq!(get_process_info(&table, &mut out, 64).unwrap(), 2);
    }

    #[test]
    fn process_info_skips_unused_slots() {
        let table = table_with(&[ProcState::Running, ProcState::Runnable, ProcState::Sleeping]);
        table.lock().unwrap().free(2).unwrap();
        let mut out = [ProcessRecord::default(); 8];
        let n = get_process_info(&table, &mut out, 8).unwrap();
        let pids: Vec<u32> = out[..n].iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![1, 3]);
        assert!(out[..n].iter().all(|r| r.state != ProcState::Unused));
    }

    #[test]
    fn root_process_reports_parent_zero() {
        let table = table_with(&[ProcState::Running]);
        let mut out = [ProcessRecord::default(); 1];
        get_process_info(&table, &mut out, 1).unwrap();
        assert_eq!(out[0].ppid, 0);
    }

    #[test]
    fn sleep_channel_only_reported_while_sleeping() {
        let table = table_with(&[ProcState::Runnable, ProcState::Runnable]);
        {
            let mut t = table.lock().unwrap();
            t.set_state(1, ProcState::Sleeping, Channel::TICKS).unwrap();
            // Stale channel left on a runnable process.
            t.get_mut(2).unwrap().chan = Channel::TICKS;
        }
        let mut out = [ProcessRecord::default(); 2];
        get_process_info(&table, &mut out, 2).unwrap();
        assert_eq!(out[0].sleep_channel, Channel::TICKS);
        assert!(out[1].sleep_channel.is_none());
    }

    #[test]
    fn poisoned_table_is_reported_and_buffer_untouched() {
        let table = table_with(&[ProcState::Running]);
        poison(&table);
        let mut out = [ProcessRecord::default(); 4];
        assert_eq!(
            get_process_info(&table, &mut out, 4),
            Err(TelemetryError::CollaboratorUnavailable {
                collaborator: "process table"
            })
        );
        assert!(out.iter().all(|r| *r == ProcessRecord::default()));
        assert!(process_queue_summary(&table).is_err());
    }

    #[test]
    fn cpu_info_names_the_running_process() {
        let table = table_with(&[ProcState::Running]);
        let cpus = Cpus::new(2);
        cpus.acquire(1).unwrap();
        let mut out = [CpuInfo::default(); 4];
        assert_eq!(get_cpu_info(&cpus, &table, &mut out, 4).unwrap(), 2);
        assert!(out[0].has_proc);
        assert_eq!(out[0].proc_name.as_str(), "p0");
        assert_eq!(out[1].cpu_id, 1);
        assert!(!out[1].has_proc);
    }
}
