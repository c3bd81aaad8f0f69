//! Status dumps printed by the kernel itself. They read through the
//! kernel-side telemetry view, so they never show up in the syscall counts.

use tracing::warn;

use super::Kernel;
use crate::report::{KernelStatus, MiniStatus};
use crate::telemetry::{
    ProcessRecord, QueryInterface, Result, SyscallStats, SystemSnapshot,
};

impl Kernel {
    pub fn status_report(&self) -> Result<String> {
        let q = self.telemetry();
        let mut snapshot = SystemSnapshot::default();
        q.getsysinfo(&mut snapshot)?;
        let mut procs = vec![ProcessRecord::default(); self.nproc];
        let n = q.getprocinfo(&mut procs, self.nproc)?;
        let mut stats = SyscallStats::default();
        q.getsyscallstats(&mut stats)?;
        Ok(KernelStatus {
            snapshot: &snapshot,
            procs: &procs[..n],
            stats: &stats,
        }
        .to_string())
    }

    pub fn mini_status(&self) -> Result<String> {
        let q = self.telemetry();
        let mut snapshot = SystemSnapshot::default();
        q.getsysinfo(&mut snapshot)?;
        let mut stats = SyscallStats::default();
        q.getsyscallstats(&mut stats)?;
        Ok(format!(
            "{}\n",
            MiniStatus {
                snapshot: &snapshot,
                total_calls: stats.total_calls,
            }
        ))
    }

    /// Writes the full dump, or the one-line form, to the console.
    pub fn dump_status(&self, mini: bool) {
        let text = if mini {
            self.mini_status()
        } else {
            self.status_report()
        };
        let written = match text {
            Ok(text) => self.console.write_str(&text),
            Err(err) => {
                warn!(%err, "kernel status unavailable");
                return;
            }
        };
        if let Err(err) = written {
            warn!(%err, "console write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::KernelConfig;
    use crate::kernel::{Console, Kernel};

    #[test]
    fn dump_is_not_counted_as_syscalls() {
        let (console, capture) = Console::capture();
        let kernel = Kernel::new(&KernelConfig::default(), console);
        let task = kernel.attach("probe").unwrap();
        kernel.dump_status(false);
        kernel.dump_status(true);
        let out = capture.contents();
        assert!(out.contains("KERNEL STATUS MONITOR"));
        assert!(out.contains("probe"));
        assert!(out.contains("| Syscalls: 0"));
        assert_eq!(kernel.syscall_stats().query().unwrap().total_calls, 0);
        drop(task);
    }
}
