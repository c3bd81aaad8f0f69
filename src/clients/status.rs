//! Polling status display.

use serde::Serialize;
use tracing::warn;

use crate::kernel::{KernelError, Task};
use crate::report::{self, MemoryDetail, ProcessList, Summary, SyscallTable};
use crate::telemetry::{
    MemoryInfo, ProcessRecord, QueryInterface, SyscallStats, SystemSnapshot, TelemetryError,
};

/// Capacity of the caller-side process buffer.
pub const MAX_PROCS: usize = 64;

#[derive(Debug, Clone)]
pub struct StatusOptions {
    pub watch: bool,
    pub procs: bool,
    pub memory: bool,
    pub syscalls: bool,
    pub json: bool,
    /// Stop watching after this many frames.
    pub count: Option<u32>,
    pub interval_ticks: u64,
}

impl Default for StatusOptions {
    fn default() -> Self {
        StatusOptions {
            watch: false,
            procs: false,
            memory: false,
            syscalls: false,
            json: false,
            count: None,
            interval_ticks: 200,
        }
    }
}

impl StatusOptions {
    pub fn all(mut self) -> Self {
        self.procs = true;
        self.memory = true;
        self.syscalls = true;
        self
    }
}

/// Everything one frame shows. Sections whose query failed are left out.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub system: SystemSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<Vec<ProcessRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syscalls: Option<SyscallStats>,
}

/// Runs the queries for one frame. Only the system snapshot is required.
pub fn collect<Q: QueryInterface + ?Sized>(
    q: &Q,
    opts: &StatusOptions,
) -> Result<StatusReport, TelemetryError> {
    let mut system = SystemSnapshot::default();
    q.getsysinfo(&mut system)?;

    let processes = opts.procs.then(|| {
        let mut buf = [ProcessRecord::default(); MAX_PROCS];
        let n = q
            .getprocinfo(&mut buf, MAX_PROCS)
            .inspect_err(|err| warn!(%err, "process list unavailable"))
            .ok()?;
        Some(buf[..n].to_vec())
    });
    let memory = opts.memory.then(|| {
        let mut mem = MemoryInfo::default();
        q.getmeminfo(&mut mem)
            .inspect_err(|err| warn!(%err, "memory info unavailable"))
            .ok()
            .map(|()| mem)
    });
    let syscalls = opts.syscalls.then(|| {
        let mut stats = SyscallStats::default();
        q.getsyscallstats(&mut stats)
            .inspect_err(|err| warn!(%err, "syscall stats unavailable"))
            .ok()
            .map(|()| stats)
    });

    Ok(StatusReport {
        system,
        processes: processes.flatten(),
        memory: memory.flatten(),
        syscalls: syscalls.flatten(),
    })
}

pub fn render_text(report: &StatusReport) -> String {
    let mut out = String::from(report::status_header());
    out.push_str(&Summary(&report.system).to_string());
    if let Some(procs) = &report.processes {
        out.push_str(&ProcessList(procs).to_string());
    }
    if let Some(mem) = &report.memory {
        out.push_str(&MemoryDetail(mem).to_string());
    }
    if let Some(stats) = &report.syscalls {
        out.push_str(&SyscallTable(stats).to_string());
    }
    out.push_str(&report::status_footer());
    out
}

/// Text for one frame, or `None` when there is no data to show.
pub fn run_frame<Q: QueryInterface + ?Sized>(q: &Q, opts: &StatusOptions) -> Option<String> {
    let report = match collect(q, opts) {
        Ok(report) => report,
        Err(err) => {
            warn!(%err, "getsysinfo failed");
            eprintln!("sysinfo: failed to get system info");
            return None;
        }
    };
    if opts.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => Some(format!("{json}\n")),
            Err(err) => {
                warn!(%err, "could not encode status report");
                None
            }
        }
    } else {
        Some(render_text(&report))
    }
}

/// Prints one frame, or keeps printing every `interval_ticks` in watch mode.
pub fn run(task: &Task, opts: &StatusOptions) -> Result<(), KernelError> {
    let mut frames = 0u32;
    loop {
        let Some(frame) = run_frame(task, opts) else {
            return Ok(());
        };
        task.print(&frame);
        frames += 1;
        if !opts.watch || opts.count.is_some_and(|limit| frames >= limit) {
            return Ok(());
        }
        task.print(&format!(
            "Refreshing in {} ticks... (Ctrl+C to stop)\n\n",
            opts.interval_ticks
        ));
        task.sleep(opts.interval_ticks)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Result;
    use std::cell::Cell;

    /// Fixed answers, optionally failing the system snapshot.
    struct Canned {
        sysinfo_fails: bool,
        procinfo_calls: Cell<u32>,
    }

    impl Canned {
        fn new(sysinfo_fails: bool) -> Self {
            Canned {
                sysinfo_fails,
                procinfo_calls: Cell::new(0),
            }
        }
    }

    fn unavailable() -> TelemetryError {
        TelemetryError::CollaboratorUnavailable {
            collaborator: "clock",
        }
    }

    impl QueryInterface for Canned {
        fn getprocinfo(&self, out: &mut [ProcessRecord], max: usize) -> Result<usize> {
            self.procinfo_calls.set(self.procinfo_calls.get() + 1);
            out[0].pid = 1;
            Ok(1.min(max))
        }

        fn getmeminfo(&self, _out: &mut MemoryInfo) -> Result<()> {
            Err(unavailable())
        }

        fn getsysinfo(&self, out: &mut SystemSnapshot) -> Result<()> {
            if self.sysinfo_fails {
                return Err(unavailable());
            }
            out.uptime = 250;
            out.ncpu = 1;
            Ok(())
        }

        fn getsyscallstats(&self, out: &mut SyscallStats) -> Result<()> {
            out.total_calls = 3;
            Ok(())
        }

        fn getcpuinfo(&self, _out: &mut [crate::telemetry::CpuInfo], _max: usize) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn failed_sysinfo_means_no_frame() {
        let q = Canned::new(true);
        assert!(run_frame(&q, &StatusOptions::default().all()).is_none());
        assert_eq!(q.procinfo_calls.get(), 0);
    }

    #[test]
    fn default_frame_has_only_the_summary() {
        let q = Canned::new(false);
        let frame = run_frame(&q, &StatusOptions::default()).unwrap();
        assert!(frame.contains("Uptime: 250 ticks (2 seconds)"));
        assert!(!frame.contains("--- PROCESS LIST ---"));
        assert_eq!(q.procinfo_calls.get(), 0);
    }

    #[test]
    fn unavailable_section_is_skipped() {
        let q = Canned::new(false);
        let report = collect(&q, &StatusOptions::default().all()).unwrap();
        assert_eq!(report.processes.as_ref().map(Vec::len), Some(1));
        assert!(report.memory.is_none());
        assert_eq!(report.syscalls.map(|s| s.total_calls), Some(3));
    }

    #[test]
    fn json_frame_omits_missing_sections() {
        let q = Canned::new(false);
        let opts = StatusOptions {
            json: true,
            ..StatusOptions::default().all()
        };
        let frame = run_frame(&q, &opts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["system"]["uptime"], 250);
        assert_eq!(value["processes"][0]["pid"], 1);
        assert!(value.get("memory").is_none());
    }
}
