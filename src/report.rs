//! Plain-text views of telemetry results, shared by the status client, the
//! supervisor and the kernel console dump.

use std::fmt;

use crate::format::bar;
use crate::telemetry::{MemoryInfo, ProcessRecord, SyscallStats, SystemSnapshot};

const STATUS_RULE: &str = "======================================================";
const KERNEL_RULE: &str = "====================================================";

pub fn status_header() -> &'static str {
    "\n============== SYSMON KERNEL STATUS MONITOR ==============\n\n"
}

pub fn status_footer() -> String {
    format!("{STATUS_RULE}\nTip: `sysmon kstatus` prints the same view from inside the kernel\n\n")
}

/// System, memory and queue sections of a snapshot.
pub struct Summary<'a>(pub &'a SystemSnapshot);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let mem = &s.mem;
        writeln!(f, "--- SYSTEM ---")?;
        writeln!(f, "Uptime: {} ticks ({} seconds)", s.uptime, s.uptime_secs())?;
        writeln!(f, "CPUs: {}", s.ncpu)?;
        writeln!(f)?;

        writeln!(f, "--- MEMORY ---")?;
        writeln!(
            f,
            "Page size:   {} bytes ({} KB)",
            mem.page_size,
            mem.page_size / 1024
        )?;
        writeln!(f, "Total pages: {} ({} KB)", mem.total_pages, mem.total_kb())?;
        writeln!(f, "Free pages:  {} ({} KB)", mem.free_pages, mem.free_kb())?;
        writeln!(f, "Used pages:  {} ({} KB)", mem.used_pages, mem.used_kb())?;
        writeln!(f, "Memory usage: {}%", mem.usage_percent())?;
        writeln!(f)?;

        let q = &s.queue;
        writeln!(f, "--- PROCESS QUEUES ---")?;
        writeln!(
            f,
            "Total active processes: {} / {}",
            q.total,
            q.total + q.unused
        )?;
        writeln!(f, "  EMBRYO   (being created): {}", q.embryo)?;
        writeln!(f, "  RUNNABLE (ready queue):   {}", q.runnable)?;
        writeln!(f, "  RUNNING  (on CPU):        {}", q.running)?;
        writeln!(f, "  SLEEPING (blocked):       {}", q.sleeping)?;
        writeln!(f, "  ZOMBIE   (waiting reap):  {}", q.zombie)?;
        writeln!(f)
    }
}

pub struct ProcessList<'a>(pub &'a [ProcessRecord]);

impl fmt::Display for ProcessList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- PROCESS LIST ---")?;
        writeln!(f, "PID   PPID  STATE     SIZE(KB)  KILLED  NAME")?;
        writeln!(f, "----  ----  --------  --------  ------  ----------------")?;
        for p in self.0 {
            writeln!(
                f,
                "{:<4}  {:<4}  {:<8}  {:<8}  {:<6}  {}",
                p.pid,
                p.ppid,
                p.state,
                p.size_kb(),
                if p.killed { "YES" } else { "NO" },
                p.name
            )?;
        }
        writeln!(f)
    }
}

pub struct MemoryDetail<'a>(pub &'a MemoryInfo);

impl fmt::Display for MemoryDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mem = self.0;
        writeln!(f, "--- MEMORY DETAILS ---")?;
        writeln!(f, "Page size:     {} bytes", mem.page_size)?;
        writeln!(f, "Kernel end:    {:#x}", mem.kernel_end)?;
        writeln!(f, "Total pages:   {}", mem.total_pages)?;
        writeln!(f, "Free pages:    {}", mem.free_pages)?;
        writeln!(f, "Used pages:    {}", mem.used_pages)?;
        writeln!(f)?;
        writeln!(
            f,
            "Memory: [{}] {}%",
            bar(mem.used_pages.into(), mem.total_pages.into(), 40),
            mem.usage_percent()
        )?;
        writeln!(f)
    }
}

pub struct SyscallTable<'a>(pub &'a SyscallStats);

impl fmt::Display for SyscallTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- SYSTEM CALL STATISTICS ---")?;
        writeln!(f, "Total system calls: {}", self.0.total_calls)?;
        writeln!(f)?;
        writeln!(f, "Syscall       Count")?;
        writeln!(f, "------------  ---------")?;
        for (call, count) in self.0.nonzero() {
            writeln!(f, "{:<12}  {}", call.name(), count)?;
        }
        let reserved = self.0.reserved();
        if reserved > 0 {
            writeln!(f, "{:<12}  {}", "reserved", reserved)?;
        }
        writeln!(f)
    }
}

/// One frame of the supervisor's watcher. `highlight` marks the target.
pub struct ProcmonListing<'a> {
    pub mem: &'a MemoryInfo,
    pub procs: &'a [ProcessRecord],
    pub highlight: Option<u32>,
}

impl fmt::Display for ProcmonListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "=== Processes [Mem: {}%] ===", self.mem.usage_percent())?;
        writeln!(f, "PID  STATE  NAME")?;
        writeln!(f, "---  -----  --------")?;
        for p in self.procs {
            let state = p.state.short_label();
            if Some(p.pid) == self.highlight {
                writeln!(f, "{:<4}>{}  {}<", p.pid, state, p.name)?;
            } else {
                writeln!(f, "{:<4} {}  {}", p.pid, state, p.name)?;
            }
        }
        writeln!(f, "=========================")
    }
}

/// Full dump printed by the kernel itself: everything in the status view
/// plus sleep channels and kill marks.
pub struct KernelStatus<'a> {
    pub snapshot: &'a SystemSnapshot,
    pub procs: &'a [ProcessRecord],
    pub stats: &'a SyscallStats,
}

impl fmt::Display for KernelStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "============== KERNEL STATUS MONITOR ==============")?;
        writeln!(f)?;
        write!(f, "{}", Summary(self.snapshot))?;

        writeln!(f, "--- PROCESS LIST ---")?;
        writeln!(f, "PID   PPID  STATE     SIZE(KB)  NAME")?;
        writeln!(f, "----  ----  --------  --------  ----------------")?;
        for p in self.procs {
            write!(
                f,
                "{:<4}  {:<4}  {:<8}  {:<8}  {}",
                p.pid,
                p.ppid,
                p.state,
                p.size_kb(),
                p.name
            )?;
            if !p.sleep_channel.is_none() {
                write!(f, " [chan: {:#x}]", p.sleep_channel.id())?;
            }
            if p.killed {
                write!(f, " [KILLED]")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "--- SYSCALL STATS ---")?;
        writeln!(f, "Total system calls: {}", self.stats.total_calls)?;
        for (call, count) in self.stats.nonzero() {
            writeln!(f, "  {:<16}{}", format!("{}:", call.name()), count)?;
        }
        let reserved = self.stats.reserved();
        if reserved > 0 {
            writeln!(f, "  {:<16}{}", "reserved:", reserved)?;
        }
        writeln!(f)?;
        writeln!(f, "{KERNEL_RULE}")?;
        writeln!(f)
    }
}

/// One-line status for frequent printing.
pub struct MiniStatus<'a> {
    pub snapshot: &'a SystemSnapshot,
    pub total_calls: u64,
}

impl fmt::Display for MiniStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.snapshot;
        write!(
            f,
            "[{}s] Mem: {}/{}KB | Procs: R:{} S:{} Z:{} | Syscalls: {}",
            s.uptime_secs(),
            s.mem.used_kb(),
            s.mem.total_kb(),
            s.queue.runnable,
            s.queue.sleeping,
            s.queue.zombie,
            self.total_calls
        )
    }
}
